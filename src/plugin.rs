//! Plugin lifecycle: one recognizer, one overlay, one input hook, owned
//! together and torn down exactly once.

use crate::commands::{about_text, CommandSink, LoggingCommandSink};
use crate::hook::{DefaultHookBackend, EngineHandle, InputHookBackend};
use crate::overlay::{default_overlay, GestureOverlay};
use crate::recognizer::{GestureRecognizer, SurfaceClassifier};
use crate::settings::GestureSettings;
use std::sync::{Arc, Mutex};

pub struct GesturePlugin {
    engine: EngineHandle,
    hook: Box<dyn InputHookBackend>,
    settings: GestureSettings,
    shut_down: bool,
}

impl GesturePlugin {
    /// Platform-default plugin: GDI overlay and low-level hooks on Windows,
    /// inert overlay and a failing hook elsewhere.
    pub fn new(
        settings: GestureSettings,
        sink: Box<dyn CommandSink>,
        surfaces: Box<dyn SurfaceClassifier>,
    ) -> Self {
        let overlay = default_overlay(&settings.overlay);
        Self::with_backend(
            settings,
            overlay,
            sink,
            surfaces,
            Box::new(DefaultHookBackend::default()),
        )
    }

    /// Fully injected constructor; tests bind fakes for every collaborator.
    pub fn with_backend(
        settings: GestureSettings,
        overlay: Box<dyn GestureOverlay>,
        sink: Box<dyn CommandSink>,
        surfaces: Box<dyn SurfaceClassifier>,
        hook: Box<dyn InputHookBackend>,
    ) -> Self {
        let engine = Arc::new(Mutex::new(GestureRecognizer::new(
            settings.threshold_px,
            overlay,
            sink,
            surfaces,
        )));
        Self {
            engine,
            hook,
            settings,
            shut_down: false,
        }
    }

    pub fn engine(&self) -> EngineHandle {
        Arc::clone(&self.engine)
    }

    /// Install the input hook. Idempotent; a failed install leaves the
    /// plugin stopped but otherwise intact.
    pub fn start(&mut self) {
        if !self.settings.enabled || self.shut_down {
            return;
        }
        if let Err(err) = self.hook.install(self.engine()) {
            tracing::error!(?err, "failed to install input hook");
        }
    }

    pub fn stop(&mut self) {
        if let Err(err) = self.hook.uninstall() {
            tracing::error!(?err, "failed to uninstall input hook");
        }
        // A session left live by an unmatched button-down would otherwise
        // linger; abort it with the hook gone.
        if let Ok(mut recognizer) = self.engine.lock() {
            recognizer.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.hook.is_installed()
    }

    pub fn update_settings(&mut self, settings: GestureSettings) {
        if self.settings == settings {
            return;
        }
        let was_running = self.is_running();
        if let Ok(mut recognizer) = self.engine.lock() {
            recognizer.set_threshold_px(settings.threshold_px);
        }
        self.settings = settings;
        if self.settings.enabled {
            if !was_running {
                self.start();
            }
        } else if was_running {
            self.stop();
        }
    }

    /// Help text for the host's About entry.
    pub fn about(&self) -> String {
        about_text()
    }

    /// Uninstall the hook and release overlay resources. Safe to call more
    /// than once; later calls are no-ops.
    pub fn shutdown(&mut self) {
        if self.shut_down {
            return;
        }
        self.stop();
        if let Ok(mut recognizer) = self.engine.lock() {
            recognizer.shutdown();
        }
        self.shut_down = true;
    }
}

impl Drop for GesturePlugin {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Default for GesturePlugin {
    fn default() -> Self {
        Self::new(
            GestureSettings::default(),
            Box::new(LoggingCommandSink),
            Box::new(crate::recognizer::AnySurface),
        )
    }
}
