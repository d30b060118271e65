//! Route table and session gating for operator-facing views.
//!
//! Views never ask the credential store whether someone is signed in; they
//! resolve the route they want against the current session and render what
//! comes back.

/// Views of the storefront admin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Route {
    Home,
    Dashboard,
    Users,
    Carts,
    Contact,
    Login,
}

impl Route {
    pub const ALL: [Route; 6] = [
        Route::Home,
        Route::Dashboard,
        Route::Users,
        Route::Carts,
        Route::Contact,
        Route::Login,
    ];

    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Dashboard => "/dashboard",
            Route::Users => "/users",
            Route::Carts => "/carts",
            Route::Contact => "/contact",
            Route::Login => "/login",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Route::Home => "Home",
            Route::Dashboard => "Dashboard",
            Route::Users => "Users",
            Route::Carts => "Cart",
            Route::Contact => "Contact",
            Route::Login => "Login",
        }
    }

    pub fn from_path(path: &str) -> Option<Route> {
        let path = path.trim_end_matches('/');
        let path = if path.is_empty() { "/" } else { path };
        Route::ALL.into_iter().find(|r| r.path() == path)
    }

    /// Views that only make sense for a signed-in operator
    pub fn requires_session(self) -> bool {
        matches!(self, Route::Dashboard | Route::Users)
    }

    /// Where a request for this route actually lands.
    ///
    /// Gated views send anonymous visitors home; the login view sends
    /// signed-in operators home.
    pub fn resolve(self, has_session: bool) -> Route {
        match self {
            r if r.requires_session() && !has_session => Route::Home,
            Route::Login if has_session => Route::Home,
            r => r,
        }
    }
}

/// Action button on the right side of the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderAction {
    Login,
    Logout,
}

/// Header contents for the current session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderLinks {
    pub links: Vec<Route>,
    pub action: Option<HeaderAction>,
    pub show_welcome: bool,
}

impl HeaderLinks {
    pub fn for_session(has_session: bool, current: Route) -> Self {
        let mut links = vec![Route::Home];
        if has_session {
            links.push(Route::Dashboard);
            links.push(Route::Carts);
        }
        links.push(Route::Contact);

        let action = match (has_session, current) {
            (true, _) => Some(HeaderAction::Logout),
            // No point offering Login on the login view itself
            (false, Route::Login) => None,
            (false, _) => Some(HeaderAction::Login),
        };

        Self {
            links,
            action,
            show_welcome: has_session,
        }
    }
}
