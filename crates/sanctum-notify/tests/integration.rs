//! Integration tests for the sanctum-notify crate: auto-dismiss timing and
//! subscriber delivery under a paused tokio clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use sanctum_notify::{
    AUTO_DISMISS_DELAY, Notification, NotificationData, NotificationService, Priority,
};

fn recorder(service: &NotificationService) -> (Arc<Mutex<Vec<Vec<String>>>>, sanctum_notify::Subscription) {
    let log = Arc::new(Mutex::new(Vec::new()));
    let l = Arc::clone(&log);
    let sub = service.subscribe(move |list: &[Notification]| {
        l.lock()
            .unwrap()
            .push(list.iter().map(|n| n.title.clone()).collect());
    });
    (log, sub)
}

#[tokio::test(start_paused = true)]
async fn normal_priority_expires_after_delay() {
    let service = NotificationService::new();
    let (log, _sub) = recorder(&service);

    let id = service.show(NotificationData::new("system", "Saved", ""));
    assert_eq!(service.pending_timers(), 1);

    tokio::time::sleep(AUTO_DISMISS_DELAY - Duration::from_millis(1)).await;
    assert!(service.get(&id).is_some());

    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(service.get(&id).is_none());
    assert_eq!(service.pending_timers(), 0);
    assert_eq!(*log.lock().unwrap(), vec![vec!["Saved".to_owned()], vec![]]);
}

#[tokio::test(start_paused = true)]
async fn other_priorities_persist() {
    let service = NotificationService::new();
    for priority in [Priority::Low, Priority::High, Priority::Urgent] {
        service.show(NotificationData::new("system", priority.to_string(), "").with_priority(priority));
    }
    assert_eq!(service.pending_timers(), 0);

    tokio::time::sleep(AUTO_DISMISS_DELAY * 3).await;
    assert_eq!(service.len(), 3);
}

#[tokio::test(start_paused = true)]
async fn dismiss_before_expiry_cancels_timer() {
    let service = NotificationService::new();
    let (log, _sub) = recorder(&service);

    let id = service.show(NotificationData::new("system", "Gone", ""));
    tokio::time::sleep(Duration::from_secs(1)).await;
    service.dismiss(&id);
    assert_eq!(service.pending_timers(), 0);

    tokio::time::sleep(AUTO_DISMISS_DELAY * 2).await;
    // show + dismiss; the cancelled timer never publishes.
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn clear_cancels_every_timer() {
    let service = NotificationService::new();
    for i in 0..5 {
        service.show(NotificationData::new("system", format!("n{i}"), ""));
    }
    service.show(NotificationData::new("system", "sticky", "").with_priority(Priority::High));
    assert_eq!(service.pending_timers(), 5);

    service.clear();
    assert!(service.get_all().is_empty());
    assert_eq!(service.pending_timers(), 0);

    let (log, _sub) = recorder(&service);
    tokio::time::sleep(AUTO_DISMISS_DELAY * 2).await;
    assert!(log.lock().unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn custom_delay() {
    let service = NotificationService::with_auto_dismiss(Duration::from_millis(100));
    service.show(NotificationData::new("system", "quick", ""));
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(service.is_empty());
}

#[tokio::test]
async fn subscribers_see_sorted_list_on_every_change() {
    let service = NotificationService::new();
    let (log, sub) = recorder(&service);

    service.show(NotificationData::new("a", "one", "").with_priority(Priority::Low));
    service.show(NotificationData::new("b", "two", "").with_priority(Priority::Urgent));
    drop(sub);
    service.show(NotificationData::new("c", "three", "").with_priority(Priority::Low));

    let log = log.lock().unwrap();
    assert_eq!(log.len(), 2);
    assert_eq!(log[1], vec!["two".to_owned(), "one".to_owned()]);
}
