//! Integration tests for the sanctum-kernel crate.
//!
//! These exercise the process table, window arena and event bus together,
//! including long pseudo-random operation sequences checked against the
//! kernel's invariants.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use sanctum_kernel::{
    EventKind, Kernel, KernelError, KernelEvent, Pid, WindowId, WindowPatch, WindowState,
};

/// Small deterministic generator so sequences are reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn pick<T: Clone>(&mut self, items: &[T]) -> Option<T> {
        if items.is_empty() {
            None
        } else {
            Some(items[(self.next() as usize) % items.len()].clone())
        }
    }
}

fn assert_invariants(kernel: &Kernel) {
    let windows = kernel.windows();

    let focused = windows.iter().filter(|w| w.focused).count();
    assert!(focused <= 1, "more than one focused window");

    let zs: HashSet<u64> = windows.iter().map(|w| w.z_index).collect();
    assert_eq!(zs.len(), windows.len(), "duplicate z-index");

    for w in &windows {
        assert!(kernel.process(w.pid).is_some(), "orphaned window {}", w.id);
    }

    if let Some(f) = kernel.focused_window() {
        assert!(f.focused);
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Processes
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn pids_are_strictly_increasing_and_never_reused() {
    let mut kernel = Kernel::new();
    let mut seen = Vec::new();
    let mut rng = Lcg(7);

    for i in 0..200 {
        let pid = kernel.create_process(format!("p{i}"), "icon");
        if let Some(&last) = seen.last() {
            assert!(pid > last);
        }
        seen.push(pid);

        if rng.next() % 2 == 0 {
            let victim = rng.pick(&seen).unwrap();
            kernel.terminate_process(victim);
        }
    }

    let unique: HashSet<Pid> = seen.iter().copied().collect();
    assert_eq!(unique.len(), seen.len());
}

#[test]
fn terminate_closes_exactly_owned_windows() {
    let mut kernel = Kernel::new();
    let a = kernel.create_process("a", "i");
    let b = kernel.create_process("b", "i");

    let a_windows: Vec<WindowId> = (0..3)
        .map(|_| kernel.create_window(a, WindowPatch::default()).unwrap())
        .collect();
    let b_windows: Vec<WindowId> = (0..2)
        .map(|_| kernel.create_window(b, WindowPatch::default()).unwrap())
        .collect();

    kernel.terminate_process(a);

    for id in &a_windows {
        assert!(kernel.window(id).is_none());
    }
    for id in &b_windows {
        assert_eq!(kernel.window(id).map(|w| w.pid), Some(b));
    }
    assert_eq!(kernel.windows_of(b).len(), 2);
}

#[test]
fn process_terminated_fires_once() {
    let mut kernel = Kernel::new();
    let pid = kernel.create_process("term", "terminal");
    kernel.create_window(pid, WindowPatch::default()).unwrap();
    kernel.create_window(pid, WindowPatch::default()).unwrap();

    let count = Arc::new(Mutex::new(0));
    let c = Arc::clone(&count);
    kernel.on(EventKind::ProcessTerminated, move |_| *c.lock().unwrap() += 1);

    kernel.terminate_process(pid);
    kernel.terminate_process(pid);
    assert_eq!(*count.lock().unwrap(), 1);
}

// ═══════════════════════════════════════════════════════════════════════
//  Windows
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn create_window_for_never_created_pid_fails() {
    let mut kernel = Kernel::new();
    let result = kernel.create_window(99, WindowPatch::default());
    assert!(matches!(result, Err(KernelError::ProcessNotFound { pid: 99 })));
}

#[test]
fn create_window_for_terminated_pid_fails() {
    let mut kernel = Kernel::new();
    let pid = kernel.create_process("gone", "i");
    kernel.terminate_process(pid);
    assert!(kernel.create_window(pid, WindowPatch::default()).is_err());
}

#[test]
fn updated_event_carries_full_window() {
    let mut kernel = Kernel::new();
    let pid = kernel.create_process("a", "i");
    let id = kernel
        .create_window(pid, WindowPatch::new().with_title("Doc").with_size(640, 480))
        .unwrap();

    let last = Arc::new(Mutex::new(None));
    let l = Arc::clone(&last);
    kernel.on(EventKind::WindowUpdated, move |e| {
        if let KernelEvent::WindowUpdated { window } = e {
            *l.lock().unwrap() = Some(window.clone());
        }
    });

    kernel
        .update_window(&id, WindowPatch::new().with_position(10, 20))
        .unwrap();

    let window = last.lock().unwrap().clone().expect("update emitted");
    assert_eq!(window.title, "Doc");
    assert_eq!((window.x, window.y), (10, 20));
    assert_eq!((window.width, window.height), (640, 480));
    assert_eq!(window.state, WindowState::Normal);
}

#[test]
fn focus_request_makes_window_unique_top() {
    let mut kernel = Kernel::new();
    let pids: Vec<Pid> = (0..3).map(|i| kernel.create_process(format!("p{i}"), "i")).collect();
    let mut ids = Vec::new();
    for &pid in &pids {
        ids.push(kernel.create_window(pid, WindowPatch::default()).unwrap());
        ids.push(kernel.create_window(pid, WindowPatch::default()).unwrap());
    }

    for id in ids.iter().rev() {
        kernel.update_window(id, WindowPatch::new().with_focused(true)).unwrap();
        let top = kernel.windows().last().map(|w| w.id.clone());
        assert_eq!(top.as_ref(), Some(id));
        assert_eq!(kernel.windows().iter().filter(|w| w.focused).count(), 1);
    }
}

#[test]
fn random_sequences_preserve_invariants() {
    let mut kernel = Kernel::new();
    let mut rng = Lcg(0x5eed);
    let mut pids: Vec<Pid> = Vec::new();

    for step in 0..1_000 {
        let windows: Vec<WindowId> = kernel.windows().iter().map(|w| w.id.clone()).collect();
        match rng.next() % 6 {
            0 => pids.push(kernel.create_process(format!("p{step}"), "i")),
            1 => {
                if let Some(pid) = rng.pick(&pids) {
                    let _ = kernel.create_window(pid, WindowPatch::default());
                }
            }
            2 => {
                if let Some(id) = rng.pick(&windows) {
                    kernel
                        .update_window(&id, WindowPatch::new().with_focused(true))
                        .unwrap();
                    let top = kernel.windows().last().map(|w| w.id.clone());
                    assert_eq!(top, Some(id.clone()));
                    assert_eq!(kernel.focused_window().map(|w| w.id.clone()), Some(id));
                }
            }
            3 => {
                if let Some(id) = rng.pick(&windows) {
                    kernel.close_window(&id).unwrap();
                }
            }
            4 => {
                if let Some(pid) = rng.pick(&pids) {
                    kernel.terminate_process(pid);
                }
            }
            _ => {
                if let Some(id) = rng.pick(&windows) {
                    kernel
                        .update_window(&id, WindowPatch::new().with_position(step, step))
                        .unwrap();
                }
            }
        }
        assert_invariants(&kernel);
    }
}

#[test]
fn listener_can_mirror_tables() {
    use std::collections::HashMap;

    let mut kernel = Kernel::new();
    let mirror: Arc<Mutex<HashMap<WindowId, Pid>>> = Arc::new(Mutex::new(HashMap::new()));

    for kind in [EventKind::WindowCreated, EventKind::WindowUpdated, EventKind::WindowClosed] {
        let m = Arc::clone(&mirror);
        kernel.on(kind, move |e| {
            let mut m = m.lock().unwrap();
            match e {
                KernelEvent::WindowCreated { window } | KernelEvent::WindowUpdated { window } => {
                    m.insert(window.id.clone(), window.pid);
                }
                KernelEvent::WindowClosed { id, .. } => {
                    m.remove(id);
                }
                _ => {}
            }
        });
    }

    let a = kernel.create_process("a", "i");
    let b = kernel.create_process("b", "i");
    kernel.create_window(a, WindowPatch::default()).unwrap();
    kernel.create_window(b, WindowPatch::default()).unwrap();
    kernel.create_window(a, WindowPatch::default()).unwrap();
    kernel.terminate_process(a);

    let mirror = mirror.lock().unwrap();
    assert_eq!(mirror.len(), kernel.window_count());
    for w in kernel.windows() {
        assert_eq!(mirror.get(&w.id), Some(&w.pid));
    }
}
