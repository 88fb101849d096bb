/// Output routes
///
/// The device has exactly one active output at a time: the local speakers or
/// a remote (cast) destination. Requests addressed to the inactive route are
/// rejected before they touch the pool.
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Playback destination a request is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Local,
    Remote,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Local => write!(f, "local"),
            Route::Remote => write!(f, "remote"),
        }
    }
}

/// Source of truth for which route is active
pub trait RouteState {
    fn is_remote_active(&self) -> bool;
}

impl<F> RouteState for F
where
    F: Fn() -> bool,
{
    fn is_remote_active(&self) -> bool {
        self()
    }
}

/// Shared casting flag, cheap to clone into UI or session code
#[derive(Debug, Clone, Default)]
pub struct CastState {
    casting: Arc<AtomicBool>,
}

impl CastState {
    pub fn new(casting: bool) -> Self {
        Self {
            casting: Arc::new(AtomicBool::new(casting)),
        }
    }

    pub fn set_casting(&self, casting: bool) {
        self.casting.store(casting, Ordering::Relaxed);
    }

    pub fn is_casting(&self) -> bool {
        self.casting.load(Ordering::Relaxed)
    }
}

impl RouteState for CastState {
    fn is_remote_active(&self) -> bool {
        self.is_casting()
    }
}

/// Platform the game runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Desktop,
    Console,
    Mobile,
    Web,
}

impl Platform {
    /// Platforms whose only output is the big screen
    pub fn always_remote(&self) -> bool {
        matches!(self, Platform::Desktop | Platform::Console)
    }
}

/// Route state derived from the platform and the casting flag
#[derive(Debug, Clone)]
pub struct PlatformRoute {
    platform: Platform,
    cast: CastState,
}

impl PlatformRoute {
    pub fn new(platform: Platform, cast: CastState) -> Self {
        Self { platform, cast }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }
}

impl RouteState for PlatformRoute {
    fn is_remote_active(&self) -> bool {
        self.platform.always_remote() || self.cast.is_casting()
    }
}

/// Admits requests aimed at the active route
pub struct RouteGate {
    state: Box<dyn RouteState>,
}

impl RouteGate {
    pub fn new(state: Box<dyn RouteState>) -> Self {
        Self { state }
    }

    pub fn active_route(&self) -> Route {
        if self.state.is_remote_active() {
            Route::Remote
        } else {
            Route::Local
        }
    }

    /// Whether a request for `route` may proceed
    pub fn admits(&self, route: Route) -> bool {
        let active = self.active_route();
        if active != route {
            tracing::debug!("Rejected {} request while {} route is active", route, active);
            return false;
        }
        true
    }
}
