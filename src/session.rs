use std::sync::Arc;

use crate::client::ApiClient;
use crate::error::ServiceResult;
use crate::types::User;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    /// Login / register.
    Entry,
    Setup,
    Dashboard,
}

impl Route {
    pub fn is_protected(&self) -> bool {
        !matches!(self, Route::Entry)
    }
}

/// Session handle injected into every view controller. Cloning shares the
/// same client and credential store.
#[derive(Clone)]
pub struct SessionContext {
    client: Arc<ApiClient>,
}

impl SessionContext {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn is_authenticated(&self) -> bool {
        self.client.is_authenticated()
    }

    pub fn current_user(&self) -> ServiceResult<Option<User>> {
        self.client.current_user()
    }

    /// Where a request for `route` actually lands given the current session.
    pub fn guard(&self, route: Route) -> Route {
        match (route.is_protected(), self.is_authenticated()) {
            (true, false) => Route::Entry,
            (false, true) => Route::Dashboard,
            _ => route,
        }
    }

    pub fn logout(&self) -> ServiceResult<Route> {
        self.client.logout()?;
        Ok(Route::Entry)
    }
}
