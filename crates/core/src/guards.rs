// Authorization guards
//
// Pure checks over the caller's id and the target's owning id. Services run
// these before issuing any write.

use uuid::Uuid;

use crate::error::{AppError, Result};

/// True when `user_id` owns the entity whose owner is `owner_id`
pub fn is_owner(owner_id: Uuid, user_id: Uuid) -> bool {
    owner_id == user_id
}

/// True when the action targets the caller themselves
pub fn is_self(target_id: Uuid, user_id: Uuid) -> bool {
    target_id == user_id
}

/// Fail with `Unauthorized` unless the caller owns the entity
pub fn ensure_owner(owner_id: Uuid, user_id: Uuid, message: &str) -> Result<()> {
    if is_owner(owner_id, user_id) {
        Ok(())
    } else {
        Err(AppError::unauthorized(message))
    }
}

/// Fail with `Unauthorized` when the caller targets themselves
pub fn ensure_not_self(target_id: Uuid, user_id: Uuid, message: &str) -> Result<()> {
    if is_self(target_id, user_id) {
        Err(AppError::unauthorized(message))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_is_owner() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert!(is_owner(a, a));
        assert!(!is_owner(a, b));
    }

    #[test]
    fn test_is_self() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert!(is_self(a, a));
        assert!(!is_self(a, b));
    }

    #[test]
    fn test_ensure_owner() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert!(ensure_owner(a, a, "nope").is_ok());

        let err = ensure_owner(a, b, "You are not authorized to modify this profile").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        assert_eq!(err.to_string(), "You are not authorized to modify this profile");
    }

    #[test]
    fn test_ensure_not_self() {
        let a = Uuid::now_v7();
        let b = Uuid::now_v7();
        assert!(ensure_not_self(b, a, "nope").is_ok());

        let err = ensure_not_self(a, a, "You can't follow yourself!").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
    }
}
