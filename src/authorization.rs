use crate::models::Board;

/// A resource with exactly one owning user.
pub trait Owned {
    fn owner_id(&self) -> i64;
}

impl Owned for Board {
    fn owner_id(&self) -> i64 {
        self.user_id
    }
}

/// is_owner
///
/// Pure ownership predicate: never fetches, never fails. The caller resolves the
/// acting user beforehand and turns `false` into `AppError::Forbidden`.
pub fn is_owner<R: Owned + ?Sized>(resource: &R, acting_user_id: i64) -> bool {
    resource.owner_id() == acting_user_id
}
