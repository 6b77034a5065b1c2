/// A signed-in user as reported by the auth collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub username: String,
    /// RFC 3339 timestamp of the sign-in.
    pub signed_in_utc: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Route {
    /// Unauthenticated visitors are redirected here.
    #[default]
    Login,
    Converter,
}

/// Session guard: evaluated on every render against externally owned session state.
pub fn guard(user: Option<&SessionUser>) -> Route {
    match user {
        Some(_) => Route::Converter,
        None => Route::Login,
    }
}
