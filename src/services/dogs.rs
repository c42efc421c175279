//! Dog Services
//!
//! Builders that turn raw store functions into authorized operations.
//!
//! The ordering differs per operation and matters:
//! - fetch one: read first, then authorize against the dog's owner
//! - create: authorize first, then stamp the owner and write
//! - update: read the stored dog, authorize against *its* owner, then
//!   stamp the owner and write
//! - fetch all: authorize first, then read
//!
//! Store failures come back as [`QueryError`]s, a denied predicate as
//! [`UnauthorizedError`], and a predicate that itself failed is passed up
//! unchanged as [`AppError::Unexpected`](crate::error::AppError::Unexpected).

use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::{QueryError, QueryOperation, Resource, Result, UnauthorizedError};
use crate::models::{Dog, Dogs, User};
use crate::services::caller;
use crate::sources::StoreResult;

// == Authorization Rules ==
/// Only the owner may read a dog.
pub fn authorize_fetch_dog() -> impl Fn(&User, &Dog) -> anyhow::Result<bool> + Clone + Send + Sync {
    |user: &User, dog: &Dog| -> anyhow::Result<bool> { Ok(dog.owner_id == user.id) }
}

/// Any identified caller may create a dog.
pub fn authorize_create_dog() -> impl Fn(&User, &Dog) -> anyhow::Result<bool> + Clone + Send + Sync
{
    |user: &User, _dog: &Dog| -> anyhow::Result<bool> { Ok(!user.id.is_empty()) }
}

/// Only the owner of the stored dog may update it.
pub fn authorize_update_dog() -> impl Fn(&User, &Dog) -> anyhow::Result<bool> + Clone + Send + Sync
{
    |user: &User, dog: &Dog| -> anyhow::Result<bool> { Ok(user.id == dog.owner_id) }
}

/// Any identified caller may list every dog.
pub fn authorize_fetch_dogs() -> impl Fn(&User) -> anyhow::Result<bool> + Clone + Send + Sync {
    |user: &User| -> anyhow::Result<bool> { Ok(!user.id.is_empty()) }
}

// == Fetch Dog ==
/// Builds the fetch-one operation: read, resolve caller, authorize.
pub fn new_fetch_dog<A, F>(authorize: A, fetch: F) -> impl Fn(&RequestContext, Uuid) -> Result<Dog>
where
    A: Fn(&User, &Dog) -> anyhow::Result<bool>,
    F: Fn(Uuid) -> StoreResult<Dog>,
{
    move |ctx: &RequestContext, id: Uuid| -> Result<Dog> {
        let dog = fetch(id)
            .map_err(|source| QueryError::new(source, Resource::Dog, QueryOperation::Fetch))?;

        let user = caller(ctx)?;
        let allowed = authorize(&user, &dog).map_err(|err| {
            ctx.log_error("failed to authorize fetchDog", &err);
            err
        })?;
        if !allowed {
            return Err(UnauthorizedError::new(user, QueryOperation::Fetch, Resource::Dog)
                .with_resource_id(dog.id)
                .into());
        }
        Ok(dog)
    }
}

// == Create Dog ==
/// Builds the create operation: resolve caller, authorize, stamp the
/// caller as owner, write.
pub fn new_create_dog<A, C>(authorize: A, create: C) -> impl Fn(&RequestContext, Dog) -> Result<Dog>
where
    A: Fn(&User, &Dog) -> anyhow::Result<bool>,
    C: Fn(Dog) -> StoreResult<Dog>,
{
    move |ctx: &RequestContext, mut dog: Dog| -> Result<Dog> {
        let user = caller(ctx)?;
        let allowed = authorize(&user, &dog).map_err(|err| {
            ctx.log_error("failed to authorize createDog", &err);
            err
        })?;
        if !allowed {
            return Err(UnauthorizedError::new(user, QueryOperation::Create, Resource::Dog).into());
        }

        dog.owner_id = user.id;
        let created = create(dog)
            .map_err(|source| QueryError::new(source, Resource::Dog, QueryOperation::Create))?;
        Ok(created)
    }
}

// == Update Dog ==
/// Builds the update operation: resolve caller, read the stored dog,
/// authorize against the stored owner, stamp the caller as owner, write.
pub fn new_update_dog<A, U, F>(
    authorize: A,
    update: U,
    fetch: F,
) -> impl Fn(&RequestContext, Dog) -> Result<Dog>
where
    A: Fn(&User, &Dog) -> anyhow::Result<bool>,
    U: Fn(Dog) -> StoreResult<Dog>,
    F: Fn(Uuid) -> StoreResult<Dog>,
{
    move |ctx: &RequestContext, mut dog: Dog| -> Result<Dog> {
        let user = caller(ctx)?;
        let existing = fetch(dog.id)
            .map_err(|source| QueryError::new(source, Resource::Dog, QueryOperation::Update))?;

        let allowed = authorize(&user, &existing).map_err(|err| {
            ctx.log_error("failed to authorize updateDog", &err);
            err
        })?;
        if !allowed {
            return Err(UnauthorizedError::new(user, QueryOperation::Update, Resource::Dog)
                .with_resource_id(existing.id)
                .into());
        }

        dog.owner_id = user.id;
        let updated = update(dog)
            .map_err(|source| QueryError::new(source, Resource::Dog, QueryOperation::Update))?;
        Ok(updated)
    }
}

// == Fetch Dogs ==
/// Builds the list operation: resolve caller, authorize, read.
pub fn new_fetch_dogs<A, F>(authorize: A, fetch: F) -> impl Fn(&RequestContext) -> Result<Dogs>
where
    A: Fn(&User) -> anyhow::Result<bool>,
    F: Fn() -> StoreResult<Dogs>,
{
    move |ctx: &RequestContext| -> Result<Dogs> {
        let user = caller(ctx)?;
        let allowed = authorize(&user).map_err(|err| {
            ctx.log_error("failed to authorize fetchDogs", &err);
            err
        })?;
        if !allowed {
            return Err(UnauthorizedError::new(user, QueryOperation::Fetch, Resource::Dogs).into());
        }

        let dogs =
            fetch().map_err(|source| QueryError::new(source, Resource::Dogs, QueryOperation::Fetch))?;
        Ok(dogs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::DogBreed;
    use crate::sources::StoreError;
    use chrono::Utc;
    use proptest::prelude::*;
    use std::cell::{Cell, RefCell};

    fn stored_dog(owner: &str) -> Dog {
        let mut dog = Dog::new("Chihua", DogBreed::Chihuahua, Utc::now()).owned_by(owner);
        dog.id = Uuid::new_v4();
        dog
    }

    fn ctx_for(user_id: &str) -> RequestContext {
        RequestContext::new().with_user(User::new(user_id))
    }

    fn failing_authorizer(_: &User, _: &Dog) -> anyhow::Result<bool> {
        Err(anyhow::anyhow!("policy service unavailable"))
    }

    // == Fetch Dog ==

    #[test]
    fn test_fetch_dog_owner_is_authorized() {
        let dog = stored_dog("alice");
        let fetches = Cell::new(0);
        let fetch_dog = new_fetch_dog(authorize_fetch_dog(), |_id| {
            fetches.set(fetches.get() + 1);
            Ok(dog.clone())
        });

        let result = fetch_dog(&ctx_for("alice"), dog.id).unwrap();

        assert_eq!(result, dog);
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn test_fetch_dog_other_user_is_unauthorized_after_one_fetch() {
        let dog = stored_dog("alice");
        let fetches = Cell::new(0);
        let fetch_dog = new_fetch_dog(authorize_fetch_dog(), |_id| {
            fetches.set(fetches.get() + 1);
            Ok(dog.clone())
        });

        let err = fetch_dog(&ctx_for("bob"), dog.id).unwrap_err();

        match err {
            AppError::Unauthorized(err) => {
                assert_eq!(err.user.id, "bob");
                assert_eq!(err.operation, Some(QueryOperation::Fetch));
                assert_eq!(err.resource_id, Some(dog.id));
            }
            other => panic!("expected unauthorized, got {other:?}"),
        }
        assert_eq!(fetches.get(), 1);
    }

    #[test]
    fn test_fetch_dog_not_found_is_wrapped() {
        let fetch_dog = new_fetch_dog(authorize_fetch_dog(), |id| {
            Err(crate::error::ResourceNotFoundError::dog(id).into())
        });

        let err = fetch_dog(&ctx_for("alice"), Uuid::new_v4()).unwrap_err();

        match err {
            AppError::Query(err) => {
                assert_eq!(err.operation, QueryOperation::Fetch);
                assert!(err.not_found().is_some());
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[test]
    fn test_fetch_dog_without_user_is_context_error() {
        let dog = stored_dog("alice");
        let fetch_dog = new_fetch_dog(authorize_fetch_dog(), |_id| Ok(dog.clone()));
        let ctx = RequestContext::new();

        let err = fetch_dog(&ctx, dog.id).unwrap_err();

        assert!(matches!(err, AppError::Context(_)));
        assert!(ctx.error_info().is_some());
    }

    #[test]
    fn test_fetch_dog_authorizer_failure_passes_through() {
        let dog = stored_dog("alice");
        let fetch_dog = new_fetch_dog(failing_authorizer, |_id| Ok(dog.clone()));

        let err = fetch_dog(&ctx_for("alice"), dog.id).unwrap_err();

        assert!(matches!(err, AppError::Unexpected(_)));
        assert_eq!(err.to_string(), "policy service unavailable");
    }

    // == Create Dog ==

    #[test]
    fn test_create_dog_stamps_owner() {
        let created = RefCell::new(None);
        let create_dog = new_create_dog(authorize_create_dog(), |mut dog: Dog| {
            dog.id = Uuid::new_v4();
            *created.borrow_mut() = Some(dog.clone());
            Ok(dog)
        });
        let input = Dog::new("Lola", DogBreed::Chihuahua, Utc::now()).owned_by("mallory");

        let result = create_dog(&ctx_for("alice"), input).unwrap();

        assert_eq!(result.owner_id, "alice");
        assert_eq!(created.borrow().as_ref().unwrap().owner_id, "alice");
    }

    #[test]
    fn test_create_dog_without_user_never_writes() {
        let writes = Cell::new(0);
        let create_dog = new_create_dog(authorize_create_dog(), |dog| {
            writes.set(writes.get() + 1);
            Ok(dog)
        });

        let err = create_dog(&RequestContext::new(), stored_dog("")).unwrap_err();

        assert!(matches!(err, AppError::Context(_)));
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn test_create_dog_empty_identity_is_unauthorized() {
        let writes = Cell::new(0);
        let create_dog = new_create_dog(authorize_create_dog(), |dog| {
            writes.set(writes.get() + 1);
            Ok(dog)
        });

        let err = create_dog(&ctx_for(""), stored_dog("")).unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn test_create_dog_authorizer_failure_never_writes() {
        let writes = Cell::new(0);
        let create_dog = new_create_dog(failing_authorizer, |dog| {
            writes.set(writes.get() + 1);
            Ok(dog)
        });
        let ctx = ctx_for("alice");

        let err = create_dog(&ctx, stored_dog("")).unwrap_err();

        assert!(matches!(err, AppError::Unexpected(_)));
        assert_eq!(writes.get(), 0);
        assert_eq!(ctx.error_info().as_deref(), Some("failed to authorize createDog"));
    }

    #[test]
    fn test_create_dog_store_failure_is_query_error() {
        let create_dog = new_create_dog(authorize_create_dog(), |_dog| {
            Err(StoreError::Unavailable("disk full".to_string()))
        });

        let err = create_dog(&ctx_for("alice"), stored_dog("")).unwrap_err();

        match err {
            AppError::Query(err) => {
                assert_eq!(err.operation, QueryOperation::Create);
                assert!(err.not_found().is_none());
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    // == Update Dog ==

    #[test]
    fn test_update_dog_checks_stored_owner_not_payload() {
        let stored = stored_dog("alice");
        let writes = Cell::new(0);
        let update_dog = new_update_dog(
            authorize_update_dog(),
            |dog| {
                writes.set(writes.get() + 1);
                Ok(dog)
            },
            |_id| Ok(stored.clone()),
        );
        let mut payload = stored.clone().owned_by("bob");
        payload.name = "Stolen".to_string();

        let err = update_dog(&ctx_for("bob"), payload).unwrap_err();

        assert!(matches!(err, AppError::Unauthorized(_)));
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn test_update_dog_keeps_caller_as_owner() {
        let stored = stored_dog("alice");
        let update_dog = new_update_dog(authorize_update_dog(), Ok, |_id| Ok(stored.clone()));
        let mut payload = stored.clone().owned_by("mallory");
        payload.name = "Lola".to_string();

        let updated = update_dog(&ctx_for("alice"), payload).unwrap();

        assert_eq!(updated.owner_id, "alice");
        assert_eq!(updated.name, "Lola");
    }

    #[test]
    fn test_update_dog_missing_is_not_found() {
        let writes = Cell::new(0);
        let update_dog = new_update_dog(
            authorize_update_dog(),
            |dog| {
                writes.set(writes.get() + 1);
                Ok(dog)
            },
            |id| Err(crate::error::ResourceNotFoundError::dog(id).into()),
        );

        let err = update_dog(&ctx_for("alice"), stored_dog("alice")).unwrap_err();

        match err {
            AppError::Query(err) => {
                assert_eq!(err.operation, QueryOperation::Update);
                assert!(err.not_found().is_some());
            }
            other => panic!("expected query error, got {other:?}"),
        }
        assert_eq!(writes.get(), 0);
    }

    #[test]
    fn test_update_dog_without_user_touches_nothing() {
        let calls = Cell::new(0);
        let update_dog = new_update_dog(
            authorize_update_dog(),
            |dog| {
                calls.set(calls.get() + 1);
                Ok(dog)
            },
            |_id| {
                calls.set(calls.get() + 1);
                Ok(stored_dog("alice"))
            },
        );

        let err = update_dog(&RequestContext::new(), stored_dog("alice")).unwrap_err();

        assert!(matches!(err, AppError::Context(_)));
        assert_eq!(calls.get(), 0);
    }

    // == Fetch Dogs ==

    #[test]
    fn test_fetch_dogs_any_user() {
        let dogs = vec![stored_dog("alice"), stored_dog("bob")];
        let fetch_dogs = new_fetch_dogs(authorize_fetch_dogs(), || Ok(dogs.clone()));

        assert_eq!(fetch_dogs(&ctx_for("carol")).unwrap(), dogs);
    }

    #[test]
    fn test_fetch_dogs_without_user_never_reads() {
        let reads = Cell::new(0);
        let fetch_dogs = new_fetch_dogs(authorize_fetch_dogs(), || {
            reads.set(reads.get() + 1);
            Ok(Vec::new())
        });

        let err = fetch_dogs(&RequestContext::new()).unwrap_err();

        assert!(matches!(err, AppError::Context(_)));
        assert_eq!(reads.get(), 0);
    }

    #[test]
    fn test_fetch_dogs_store_failure_is_query_error() {
        let fetch_dogs = new_fetch_dogs(authorize_fetch_dogs(), || Err(StoreError::Poisoned));

        let err = fetch_dogs(&ctx_for("alice")).unwrap_err();

        match err {
            AppError::Query(err) => {
                assert_eq!(err.resource, Resource::Dogs);
                assert_eq!(err.operation, QueryOperation::Fetch);
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        // Whatever owner the payload claims, the created dog belongs to the caller.
        #[test]
        fn prop_create_dog_owner_is_caller(
            caller_id in "[a-z0-9-]{1,24}",
            claimed_owner in ".{0,24}",
        ) {
            let create_dog = new_create_dog(authorize_create_dog(), |mut dog: Dog| {
                dog.id = Uuid::new_v4();
                Ok(dog)
            });
            let input = Dog::new("Chihua", DogBreed::Chihuahua, Utc::now()).owned_by(claimed_owner);

            let created = create_dog(&ctx_for(&caller_id), input).unwrap();
            prop_assert_eq!(created.owner_id, caller_id);
        }
    }
}
