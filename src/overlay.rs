//! Gesture trail and label rendering.
//!
//! The renderer is not authoritative about gesture semantics: it draws the
//! segments and label text it is handed and nothing else. Drawing happens
//! into an off-screen buffer covering the virtual desktop; `present` blits
//! the whole buffer to a transparent, input-transparent, topmost window in
//! one copy, so the visible state is always one full frame current.

use crate::engine::Point;
use crate::settings::OverlaySettings;

/// Rendering surface for gesture feedback.
///
/// Every operation is a no-op when graphics resources are unavailable;
/// recognition and dispatch never depend on the overlay succeeding.
pub trait GestureOverlay: Send {
    /// Materialize resources if needed, clear the buffer, and make the
    /// window visible without taking input focus.
    fn show(&mut self);
    fn draw_segment(&mut self, from: Point, to: Point);
    fn draw_label(&mut self, text: &str);
    /// Blit the entire off-screen buffer to the visible surface.
    fn present(&mut self);
    /// Hide the window; buffer contents are cleared lazily on next `show`.
    fn hide(&mut self);
    /// Release all graphics resources. Idempotent; the overlay stays inert
    /// afterwards.
    fn shutdown(&mut self);
}

/// Fallback used on platforms without an overlay implementation and as the
/// inert default in headless contexts.
#[derive(Debug, Default)]
pub struct NoopOverlay;

impl GestureOverlay for NoopOverlay {
    fn show(&mut self) {}
    fn draw_segment(&mut self, _from: Point, _to: Point) {}
    fn draw_label(&mut self, _text: &str) {}
    fn present(&mut self) {}
    fn hide(&mut self) {}
    fn shutdown(&mut self) {}
}

/// Platform default: GDI on Windows, inert elsewhere.
pub fn default_overlay(settings: &OverlaySettings) -> Box<dyn GestureOverlay> {
    #[cfg(windows)]
    {
        Box::new(gdi::GdiOverlay::new(settings.clone()))
    }
    #[cfg(not(windows))]
    {
        let _ = settings;
        Box::new(NoopOverlay)
    }
}

#[cfg(windows)]
pub use gdi::GdiOverlay;

#[cfg(windows)]
mod gdi {
    use super::GestureOverlay;
    use crate::engine::Point;
    use crate::settings::OverlaySettings;
    use windows::core::PCWSTR;
    use windows::Win32::Foundation::{COLORREF, HWND, LPARAM, LRESULT, RECT, WPARAM};
    use windows::Win32::Graphics::Gdi::{
        BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, CreateFontIndirectW, CreatePen,
        DeleteDC, DeleteObject, FillRect, GetDC, GetStockObject, LineTo, MoveToEx, ReleaseDC,
        SelectObject, SetBkMode, SetTextColor, TextOutW, BLACK_BRUSH, HBITMAP, HBRUSH, HDC, HFONT,
        HGDIOBJ, HPEN, LOGFONTW, PS_SOLID, SRCCOPY, TRANSPARENT,
    };
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::{
        CreateWindowExW, DefWindowProcW, DestroyWindow, GetSystemMetrics, RegisterClassW,
        SetLayeredWindowAttributes, ShowWindow, LWA_COLORKEY, SM_CXVIRTUALSCREEN,
        SM_CYVIRTUALSCREEN, SM_XVIRTUALSCREEN, SM_YVIRTUALSCREEN, SW_HIDE, SW_SHOWNOACTIVATE,
        WNDCLASSW, WS_EX_LAYERED, WS_EX_TOOLWINDOW, WS_EX_TOPMOST, WS_EX_TRANSPARENT, WS_POPUP,
    };

    /// Region the token label is drawn into, in buffer coordinates.
    const LABEL_RECT: RECT = RECT {
        left: 10,
        top: 10,
        right: 600,
        bottom: 140,
    };

    unsafe extern "system" fn overlay_wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        DefWindowProcW(hwnd, msg, wparam, lparam)
    }

    fn parse_color(value: &str) -> COLORREF {
        let raw = value.trim().trim_start_matches('#');
        if raw.len() != 6 {
            return COLORREF(0x0000_00ff);
        }
        let r = u8::from_str_radix(&raw[0..2], 16).unwrap_or(0xff);
        let g = u8::from_str_radix(&raw[2..4], 16).unwrap_or(0x00);
        let b = u8::from_str_radix(&raw[4..6], 16).unwrap_or(0x00);
        COLORREF((r as u32) | ((g as u32) << 8) | ((b as u32) << 16))
    }

    fn background_brush() -> HBRUSH {
        HBRUSH(unsafe { GetStockObject(BLACK_BRUSH) }.0)
    }

    struct GdiPen(HPEN);

    impl GdiPen {
        fn new(width: i32, color: COLORREF) -> Option<Self> {
            let pen = unsafe { CreatePen(PS_SOLID, width, color) };
            (!pen.0.is_null()).then_some(Self(pen))
        }
    }

    impl Drop for GdiPen {
        fn drop(&mut self) {
            unsafe {
                let _ = DeleteObject(self.0);
            }
        }
    }

    struct GdiFont(HFONT);

    impl GdiFont {
        fn new(height: i32, face: &str) -> Option<Self> {
            let mut logfont = LOGFONTW::default();
            logfont.lfHeight = -height;
            for (idx, unit) in face.encode_utf16().take(31).enumerate() {
                logfont.lfFaceName[idx] = unit;
            }
            let font = unsafe { CreateFontIndirectW(&logfont) };
            (!font.0.is_null()).then_some(Self(font))
        }
    }

    impl Drop for GdiFont {
        fn drop(&mut self) {
            unsafe {
                let _ = DeleteObject(self.0);
            }
        }
    }

    /// Off-screen DC plus its backing bitmap; restores and releases both on
    /// every exit path.
    struct MemoryCanvas {
        dc: HDC,
        bitmap: HBITMAP,
        old_bitmap: HGDIOBJ,
    }

    impl MemoryCanvas {
        fn new(width: i32, height: i32) -> Option<Self> {
            unsafe {
                let screen_dc = GetDC(HWND::default());
                if screen_dc.0.is_null() {
                    return None;
                }
                let dc = CreateCompatibleDC(screen_dc);
                if dc.0.is_null() {
                    let _ = ReleaseDC(HWND::default(), screen_dc);
                    return None;
                }
                let bitmap = CreateCompatibleBitmap(screen_dc, width, height);
                let _ = ReleaseDC(HWND::default(), screen_dc);
                if bitmap.0.is_null() {
                    let _ = DeleteDC(dc);
                    return None;
                }
                let old_bitmap = SelectObject(dc, HGDIOBJ(bitmap.0));
                Some(Self {
                    dc,
                    bitmap,
                    old_bitmap,
                })
            }
        }
    }

    impl Drop for MemoryCanvas {
        fn drop(&mut self) {
            unsafe {
                SelectObject(self.dc, self.old_bitmap);
                let _ = DeleteObject(self.bitmap);
                let _ = DeleteDC(self.dc);
            }
        }
    }

    struct OverlayWindow(HWND);

    impl OverlayWindow {
        fn create(x: i32, y: i32, width: i32, height: i32) -> Option<Self> {
            unsafe {
                let class_name = windows::core::w!("EditorGestureOverlay");
                let hinstance = GetModuleHandleW(None).ok()?;
                let wc = WNDCLASSW {
                    lpfnWndProc: Some(overlay_wndproc),
                    hInstance: hinstance.into(),
                    lpszClassName: class_name,
                    ..Default::default()
                };
                // Re-registration after a previous shutdown fails harmlessly.
                let _ = RegisterClassW(&wc);

                let hwnd = CreateWindowExW(
                    WS_EX_LAYERED | WS_EX_TRANSPARENT | WS_EX_TOOLWINDOW | WS_EX_TOPMOST,
                    class_name,
                    PCWSTR::null(),
                    WS_POPUP,
                    x,
                    y,
                    width,
                    height,
                    None,
                    None,
                    hinstance,
                    None,
                )
                .ok()?;
                if hwnd.0.is_null() {
                    return None;
                }
                // Black is the color key: anything left at the background
                // color is fully transparent on screen.
                let _ = SetLayeredWindowAttributes(hwnd, COLORREF(0), 255, LWA_COLORKEY);
                Some(Self(hwnd))
            }
        }
    }

    impl Drop for OverlayWindow {
        fn drop(&mut self) {
            unsafe {
                let _ = DestroyWindow(self.0);
            }
        }
    }

    struct OverlayResources {
        window: OverlayWindow,
        canvas: MemoryCanvas,
        pen: GdiPen,
        font: GdiFont,
        origin: (i32, i32),
        width: i32,
        height: i32,
        color: COLORREF,
    }

    impl OverlayResources {
        fn create(settings: &OverlaySettings) -> Option<Self> {
            let (x, y, width, height) = unsafe {
                (
                    GetSystemMetrics(SM_XVIRTUALSCREEN),
                    GetSystemMetrics(SM_YVIRTUALSCREEN),
                    GetSystemMetrics(SM_CXVIRTUALSCREEN),
                    GetSystemMetrics(SM_CYVIRTUALSCREEN),
                )
            };
            let color = parse_color(&settings.color);
            let window = OverlayWindow::create(x, y, width, height)?;
            let canvas = MemoryCanvas::new(width, height)?;
            let pen = GdiPen::new(settings.thickness as i32, color)?;
            let font = GdiFont::new(settings.label_height, &settings.font_face)?;
            Some(Self {
                window,
                canvas,
                pen,
                font,
                origin: (x, y),
                width,
                height,
                color,
            })
        }

        fn clear(&self) {
            let bounds = RECT {
                left: 0,
                top: 0,
                right: self.width,
                bottom: self.height,
            };
            unsafe {
                FillRect(self.canvas.dc, &bounds, background_brush());
            }
        }
    }

    /// GDI implementation over a layered, color-keyed, topmost tool window
    /// sized to the virtual desktop. Resources are created lazily on the
    /// first `show` and released exactly once at `shutdown`; a failed
    /// creation turns every call into a no-op until the next `show`.
    pub struct GdiOverlay {
        settings: OverlaySettings,
        resources: Option<OverlayResources>,
        shut_down: bool,
    }

    // The overlay is constructed on the host thread but only ever used from
    // the hook thread; GDI handles never cross threads after creation.
    unsafe impl Send for GdiOverlay {}

    impl GdiOverlay {
        pub fn new(settings: OverlaySettings) -> Self {
            Self {
                settings,
                resources: None,
                shut_down: false,
            }
        }

        fn ensure_resources(&mut self) -> bool {
            if self.shut_down {
                return false;
            }
            if self.resources.is_none() {
                self.resources = OverlayResources::create(&self.settings);
                if self.resources.is_none() {
                    tracing::warn!("overlay resources unavailable; gesture feedback disabled");
                }
            }
            self.resources.is_some()
        }
    }

    impl GestureOverlay for GdiOverlay {
        fn show(&mut self) {
            if !self.ensure_resources() {
                return;
            }
            if let Some(res) = &self.resources {
                res.clear();
                unsafe {
                    let _ = ShowWindow(res.window.0, SW_SHOWNOACTIVATE);
                }
            }
        }

        fn draw_segment(&mut self, from: Point, to: Point) {
            let Some(res) = &self.resources else {
                return;
            };
            unsafe {
                let old = SelectObject(res.canvas.dc, res.pen.0);
                let _ = MoveToEx(
                    res.canvas.dc,
                    from.x as i32 - res.origin.0,
                    from.y as i32 - res.origin.1,
                    None,
                );
                let _ = LineTo(
                    res.canvas.dc,
                    to.x as i32 - res.origin.0,
                    to.y as i32 - res.origin.1,
                );
                SelectObject(res.canvas.dc, old);
            }
        }

        fn draw_label(&mut self, text: &str) {
            let Some(res) = &self.resources else {
                return;
            };
            let wide: Vec<u16> = text.encode_utf16().collect();
            unsafe {
                // Clear only the label region; a transparent text background
                // keeps the trail intact everywhere else.
                FillRect(res.canvas.dc, &LABEL_RECT, background_brush());
                let old_font = SelectObject(res.canvas.dc, res.font.0);
                SetBkMode(res.canvas.dc, TRANSPARENT);
                SetTextColor(res.canvas.dc, res.color);
                let _ = TextOutW(res.canvas.dc, LABEL_RECT.left, LABEL_RECT.top, &wide);
                SelectObject(res.canvas.dc, old_font);
            }
        }

        fn present(&mut self) {
            let Some(res) = &self.resources else {
                return;
            };
            unsafe {
                let wnd_dc = GetDC(res.window.0);
                if wnd_dc.0.is_null() {
                    return;
                }
                let _ = BitBlt(
                    wnd_dc,
                    0,
                    0,
                    res.width,
                    res.height,
                    res.canvas.dc,
                    0,
                    0,
                    SRCCOPY,
                );
                let _ = ReleaseDC(res.window.0, wnd_dc);
            }
        }

        fn hide(&mut self) {
            if let Some(res) = &self.resources {
                unsafe {
                    let _ = ShowWindow(res.window.0, SW_HIDE);
                }
            }
        }

        fn shutdown(&mut self) {
            self.resources = None;
            self.shut_down = true;
        }
    }
}
