/// Router Module Index
///
/// Splits the routing table by access level. Authentication is applied as a
/// layer on the whole `authenticated` router, so a protected endpoint cannot be
/// exposed by forgetting an extractor.

/// Routes open to anonymous clients: the feed, board details, registration and login.
pub mod public;

/// Routes behind the session check. An anonymous request is redirected to the login form.
pub mod authenticated;
