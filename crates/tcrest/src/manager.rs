//! Per-resource entry points.

use std::marker::PhantomData;

use crate::queryset::QuerySet;
use crate::resources::Resource;
use crate::session::TeamCity;

/// Hands out fresh [`QuerySet`]s for one resource type.
///
/// Holds nothing but the session handle, so query sets taken from the same
/// manager never share filters or cached data.
pub struct Manager<R: Resource> {
    session: TeamCity,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for Manager<R> {
    fn clone(&self) -> Self {
        Self::new(self.session.clone())
    }
}

impl<R: Resource> std::fmt::Debug for Manager<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager").field("path", &R::PATH).finish()
    }
}

impl<R: Resource> Manager<R> {
    pub fn new(session: TeamCity) -> Self {
        Self {
            session,
            _resource: PhantomData,
        }
    }

    /// A new, unfiltered query set.
    pub fn all(&self) -> QuerySet<R> {
        QuerySet::new(self.session.clone())
    }

    pub fn session(&self) -> &TeamCity {
        &self.session
    }
}
