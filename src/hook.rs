//! Input source binding.
//!
//! The recognizer is driven through an injected backend: production installs
//! low-level mouse and keyboard hooks on a dedicated hook thread and invokes
//! the recognizer synchronously from the hook callback; tests drive the same
//! recognizer through [`MockHookBackend`] with scripted events, so the
//! recognition logic never depends on a live windowing system.

use crate::recognizer::GestureRecognizer;
use std::sync::{Arc, Mutex};

#[cfg(windows)]
use anyhow::anyhow;

/// Shared handle to the one recognizer instance. The mutex is only ever
/// contended at install/uninstall; during a gesture the hook thread is the
/// single accessor.
pub type EngineHandle = Arc<Mutex<GestureRecognizer>>;

pub trait InputHookBackend: Send {
    fn install(&mut self, engine: EngineHandle) -> anyhow::Result<()>;
    fn uninstall(&mut self) -> anyhow::Result<()>;
    fn is_installed(&self) -> bool;
}

pub const LLMHF_INJECTED: u32 = 0x0000_0001;
pub const LLMHF_LOWER_IL_INJECTED: u32 = 0x0000_0002;

/// Events synthesized by any process are never fed to the recognizer; the
/// hook only reacts to physical input.
pub fn should_ignore_event(flags: u32) -> bool {
    flags & (LLMHF_INJECTED | LLMHF_LOWER_IL_INJECTED) != 0
}

#[cfg(windows)]
struct HookThread {
    thread_id: u32,
    join: std::thread::JoinHandle<()>,
}

/// Production backend: `WH_MOUSE_LL` for pointer events plus `WH_KEYBOARD_LL`
/// for Escape-cancel, both serviced by one dedicated hook thread running a
/// message loop. Install only returns once that thread has signalled that
/// the hooks are live.
#[cfg(windows)]
#[derive(Default)]
pub struct DefaultHookBackend {
    hook_thread: Option<HookThread>,
}

#[cfg(windows)]
unsafe impl Send for DefaultHookBackend {}

#[cfg(windows)]
impl InputHookBackend for DefaultHookBackend {
    fn install(&mut self, engine: EngineHandle) -> anyhow::Result<()> {
        if self.hook_thread.is_some() {
            return Ok(());
        }

        set_hook_engine(Some(engine));

        use std::time::Duration;
        use windows::Win32::System::LibraryLoader::GetModuleHandleW;
        use windows::Win32::System::Threading::GetCurrentThreadId;
        use windows::Win32::UI::WindowsAndMessaging::{
            DispatchMessageW, GetMessageW, PeekMessageW, SetWindowsHookExW, TranslateMessage,
            UnhookWindowsHookEx, MSG, PM_NOREMOVE, WH_KEYBOARD_LL, WH_MOUSE_LL,
        };

        // Handshake so install() only returns once the hooks are actually in
        // place.
        let (ready_tx, ready_rx) = std::sync::mpsc::sync_channel::<anyhow::Result<u32>>(1);

        let join = std::thread::spawn(move || {
            // Ensure the thread has a message queue.
            let mut msg = MSG::default();
            unsafe {
                let _ = PeekMessageW(&mut msg, None, 0, 0, PM_NOREMOVE);
            }

            let thread_id = unsafe { GetCurrentThreadId() };

            let hmodule = match unsafe { GetModuleHandleW(None) } {
                Ok(h) => h,
                Err(e) => {
                    let _ = ready_tx.send(Err(anyhow!(e)));
                    return;
                }
            };

            let mouse_hook = match unsafe {
                SetWindowsHookExW(WH_MOUSE_LL, Some(mouse_hook_proc), hmodule, 0)
            } {
                Ok(h) if !h.0.is_null() => h,
                Ok(_) => {
                    let _ = ready_tx.send(Err(anyhow!(windows::core::Error::from_win32())));
                    return;
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(anyhow!(e)));
                    return;
                }
            };

            let keyboard_hook = match unsafe {
                SetWindowsHookExW(WH_KEYBOARD_LL, Some(keyboard_hook_proc), hmodule, 0)
            } {
                Ok(h) if !h.0.is_null() => h,
                Ok(_) => {
                    let _ = ready_tx.send(Err(anyhow!(windows::core::Error::from_win32())));
                    unsafe {
                        let _ = UnhookWindowsHookEx(mouse_hook);
                    }
                    return;
                }
                Err(e) => {
                    let _ = ready_tx.send(Err(anyhow!(e)));
                    unsafe {
                        let _ = UnhookWindowsHookEx(mouse_hook);
                    }
                    return;
                }
            };

            let _ = ready_tx.send(Ok(thread_id));

            // The message loop keeps low-level hook callbacks flowing.
            loop {
                let r = unsafe { GetMessageW(&mut msg, None, 0, 0) };
                if r.0 == 0 || r.0 == -1 {
                    break;
                }
                unsafe {
                    let _ = TranslateMessage(&msg);
                    DispatchMessageW(&msg);
                }
            }

            unsafe {
                let _ = UnhookWindowsHookEx(mouse_hook);
                let _ = UnhookWindowsHookEx(keyboard_hook);
            }
        });

        let thread_id = match ready_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(Ok(thread_id)) => thread_id,
            Ok(Err(err)) => {
                set_hook_engine(None);
                return Err(err);
            }
            Err(_) => {
                set_hook_engine(None);
                return Err(anyhow!("hook thread did not signal readiness"));
            }
        };

        self.hook_thread = Some(HookThread { thread_id, join });
        Ok(())
    }

    fn uninstall(&mut self) -> anyhow::Result<()> {
        // Detach the recognizer first so no new work arrives during shutdown.
        set_hook_engine(None);

        if let Some(th) = self.hook_thread.take() {
            use windows::Win32::Foundation::{LPARAM, WPARAM};
            use windows::Win32::UI::WindowsAndMessaging::{PostThreadMessageW, WM_QUIT};
            unsafe {
                let _ = PostThreadMessageW(th.thread_id, WM_QUIT, WPARAM(0), LPARAM(0));
            }
            let _ = th.join.join();
        }

        Ok(())
    }

    fn is_installed(&self) -> bool {
        self.hook_thread.is_some()
    }
}

#[cfg(not(windows))]
#[derive(Default)]
pub struct DefaultHookBackend;

#[cfg(not(windows))]
impl InputHookBackend for DefaultHookBackend {
    fn install(&mut self, _engine: EngineHandle) -> anyhow::Result<()> {
        Err(anyhow::anyhow!(
            "input hooks are not supported on this platform"
        ))
    }

    fn uninstall(&mut self) -> anyhow::Result<()> {
        Ok(())
    }

    fn is_installed(&self) -> bool {
        false
    }
}

// Low-level hook procedures cannot carry context, so the engine handle lives
// in a process-wide cell set at install and cleared at uninstall.
#[cfg(windows)]
static HOOK_ENGINE: once_cell::sync::OnceCell<Mutex<Option<EngineHandle>>> =
    once_cell::sync::OnceCell::new();

#[cfg(windows)]
fn hook_engine_cell() -> &'static Mutex<Option<EngineHandle>> {
    HOOK_ENGINE.get_or_init(|| Mutex::new(None))
}

#[cfg(windows)]
fn set_hook_engine(engine: Option<EngineHandle>) {
    if let Ok(mut guard) = hook_engine_cell().lock() {
        *guard = engine;
    }
}

#[cfg(windows)]
fn installed_engine() -> Option<EngineHandle> {
    hook_engine_cell().try_lock().ok()?.clone()
}

#[cfg(windows)]
unsafe extern "system" fn mouse_hook_proc(
    n_code: i32,
    w_param: windows::Win32::Foundation::WPARAM,
    l_param: windows::Win32::Foundation::LPARAM,
) -> windows::Win32::Foundation::LRESULT {
    use crate::engine::{Point, SurfaceHandle};
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, WindowFromPoint, HC_ACTION, HHOOK, MSLLHOOKSTRUCT, WM_MOUSEMOVE,
        WM_RBUTTONDOWN, WM_RBUTTONUP,
    };

    if n_code == HC_ACTION as i32 {
        let msg = w_param.0 as u32;
        if msg == WM_RBUTTONDOWN || msg == WM_RBUTTONUP || msg == WM_MOUSEMOVE {
            let info = &*(l_param.0 as *const MSLLHOOKSTRUCT);
            if !should_ignore_event(info.flags) {
                if let Some(engine) = installed_engine() {
                    // Never block input delivery: skip the event rather than
                    // wait on a contended engine.
                    if let Ok(mut recognizer) = engine.try_lock() {
                        let point = Point {
                            x: info.pt.x as f32,
                            y: info.pt.y as f32,
                        };
                        let consumed = match msg {
                            WM_RBUTTONDOWN => {
                                let hwnd = WindowFromPoint(info.pt);
                                recognizer
                                    .pointer_down(point, SurfaceHandle(hwnd.0 as isize))
                            }
                            WM_MOUSEMOVE => recognizer.pointer_move(point),
                            WM_RBUTTONUP => recognizer.pointer_up(),
                            _ => false,
                        };
                        if consumed {
                            return windows::Win32::Foundation::LRESULT(1);
                        }
                    }
                }
            }
        }
    }

    CallNextHookEx(HHOOK(std::ptr::null_mut()), n_code, w_param, l_param)
}

#[cfg(windows)]
unsafe extern "system" fn keyboard_hook_proc(
    n_code: i32,
    w_param: windows::Win32::Foundation::WPARAM,
    l_param: windows::Win32::Foundation::LPARAM,
) -> windows::Win32::Foundation::LRESULT {
    use windows::Win32::UI::Input::KeyboardAndMouse::VK_ESCAPE;
    use windows::Win32::UI::WindowsAndMessaging::{
        CallNextHookEx, HC_ACTION, HHOOK, KBDLLHOOKSTRUCT, KBDLLHOOKSTRUCT_FLAGS, WM_KEYDOWN,
        WM_SYSKEYDOWN,
    };

    if n_code == HC_ACTION as i32 {
        let msg = w_param.0 as u32;
        if msg == WM_KEYDOWN || msg == WM_SYSKEYDOWN {
            let info = &*(l_param.0 as *const KBDLLHOOKSTRUCT);
            let injected = (info.flags & KBDLLHOOKSTRUCT_FLAGS(0x10)) != KBDLLHOOKSTRUCT_FLAGS(0);
            if !injected && info.vkCode == VK_ESCAPE.0 as u32 {
                if let Some(engine) = installed_engine() {
                    if let Ok(mut recognizer) = engine.try_lock() {
                        if recognizer.cancel() {
                            return windows::Win32::Foundation::LRESULT(1);
                        }
                    }
                }
            }
        }
    }

    CallNextHookEx(HHOOK(std::ptr::null_mut()), n_code, w_param, l_param)
}

/// Scripted backend for tests: forwards events straight to the installed
/// recognizer, mirroring what the hook procedures do, and counts lifecycle
/// calls.
#[derive(Clone, Default)]
pub struct MockHookBackend {
    state: Arc<MockHookState>,
}

#[derive(Default)]
struct MockHookState {
    install_count: std::sync::atomic::AtomicUsize,
    uninstall_count: std::sync::atomic::AtomicUsize,
    engine: Mutex<Option<EngineHandle>>,
}

impl MockHookBackend {
    pub fn new() -> (Self, MockHookHandle) {
        let state = Arc::new(MockHookState::default());
        (
            Self {
                state: Arc::clone(&state),
            },
            MockHookHandle { state },
        )
    }
}

impl InputHookBackend for MockHookBackend {
    fn install(&mut self, engine: EngineHandle) -> anyhow::Result<()> {
        use std::sync::atomic::Ordering;
        let mut guard = self
            .state
            .engine
            .lock()
            .map_err(|_| anyhow::anyhow!("lock"))?;
        if guard.is_none() {
            self.state.install_count.fetch_add(1, Ordering::SeqCst);
            *guard = Some(engine);
        }
        Ok(())
    }

    fn uninstall(&mut self) -> anyhow::Result<()> {
        use std::sync::atomic::Ordering;
        let mut guard = self
            .state
            .engine
            .lock()
            .map_err(|_| anyhow::anyhow!("lock"))?;
        if guard.is_some() {
            self.state.uninstall_count.fetch_add(1, Ordering::SeqCst);
        }
        *guard = None;
        Ok(())
    }

    fn is_installed(&self) -> bool {
        match self.state.engine.lock() {
            Ok(guard) => guard.is_some(),
            Err(_) => false,
        }
    }
}

pub struct MockHookHandle {
    state: Arc<MockHookState>,
}

impl MockHookHandle {
    pub fn install_count(&self) -> usize {
        self.state
            .install_count
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn uninstall_count(&self) -> usize {
        self.state
            .uninstall_count
            .load(std::sync::atomic::Ordering::SeqCst)
    }

    fn with_engine<R>(&self, f: impl FnOnce(&mut GestureRecognizer) -> R) -> Option<R> {
        let guard = self.state.engine.lock().ok()?;
        let engine = guard.as_ref()?.clone();
        drop(guard);
        let mut recognizer = engine.lock().ok()?;
        Some(f(&mut recognizer))
    }

    pub fn emit_down(&self, point: crate::engine::Point, surface: crate::engine::SurfaceHandle) -> bool {
        self.with_engine(|r| r.pointer_down(point, surface))
            .unwrap_or(false)
    }

    pub fn emit_move(&self, point: crate::engine::Point) -> bool {
        self.with_engine(|r| r.pointer_move(point)).unwrap_or(false)
    }

    pub fn emit_up(&self) -> bool {
        self.with_engine(|r| r.pointer_up()).unwrap_or(false)
    }

    pub fn emit_cancel(&self) -> bool {
        self.with_engine(|r| r.cancel()).unwrap_or(false)
    }
}

/// Eligibility check by window class name, matching the reference host's
/// text panes ("Scintilla"). Only consulted at pointer-down.
#[cfg(windows)]
pub struct WindowClassSurface {
    class_name: String,
}

#[cfg(windows)]
impl WindowClassSurface {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
        }
    }
}

#[cfg(windows)]
impl Default for WindowClassSurface {
    fn default() -> Self {
        Self::new("Scintilla")
    }
}

#[cfg(windows)]
impl crate::recognizer::SurfaceClassifier for WindowClassSurface {
    fn is_text_surface(&self, surface: crate::engine::SurfaceHandle) -> bool {
        use windows::Win32::Foundation::HWND;
        use windows::Win32::UI::WindowsAndMessaging::GetClassNameW;

        if surface.0 == 0 {
            return false;
        }
        let hwnd = HWND(surface.0 as *mut _);
        let mut buffer = [0u16; 64];
        let len = unsafe { GetClassNameW(hwnd, &mut buffer) };
        if len <= 0 {
            return false;
        }
        let name = String::from_utf16_lossy(&buffer[..len as usize]);
        name.eq_ignore_ascii_case(&self.class_name)
    }
}
