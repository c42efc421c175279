//! Services Module
//!
//! Wraps raw store operations with caller resolution, authorization and
//! error classification. Each operation keeps its own ordering of those
//! steps; see [`dogs`].

pub mod dogs;

use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use crate::context::RequestContext;
use crate::error::Result;
use crate::models::{Dog, Dogs, User};
use crate::sources::DogStore;

pub use dogs::{
    authorize_create_dog, authorize_fetch_dog, authorize_fetch_dogs, authorize_update_dog,
    new_create_dog, new_fetch_dog, new_fetch_dogs, new_update_dog,
};

/// Resolves the caller from the request context.
///
/// A missing caller means the auth middleware was not applied, so it is
/// logged as an error rather than treated as a client fault.
pub(crate) fn caller(ctx: &RequestContext) -> Result<User> {
    match ctx.user() {
        Ok(user) => {
            ctx.log_field("user_id", &user.id);
            Ok(user.clone())
        }
        Err(err) => {
            error!(trace_id = %ctx.trace_id(), error = %err, "Failed to get user from request context");
            ctx.log_error("Context Error", &err);
            Err(err.into())
        }
    }
}

type FetchDogOp = dyn Fn(&RequestContext, Uuid) -> Result<Dog> + Send + Sync;
type SaveDogOp = dyn Fn(&RequestContext, Dog) -> Result<Dog> + Send + Sync;
type FetchDogsOp = dyn Fn(&RequestContext) -> Result<Dogs> + Send + Sync;

// == Dog Services ==
/// The authorized dog operations used by both the REST and GraphQL APIs.
#[derive(Clone)]
pub struct DogServices {
    fetch_dog: Arc<FetchDogOp>,
    create_dog: Arc<SaveDogOp>,
    update_dog: Arc<SaveDogOp>,
    fetch_dogs: Arc<FetchDogsOp>,
}

impl DogServices {
    /// Wires the default authorization rules around `store`.
    pub fn new(store: Arc<dyn DogStore>) -> Self {
        let fetch_store = store.clone();
        let create_store = store.clone();
        let update_store = store.clone();
        let update_fetch_store = store.clone();
        let list_store = store;

        Self {
            fetch_dog: Arc::new(new_fetch_dog(authorize_fetch_dog(), move |id: Uuid| {
                fetch_store.fetch_dog(id)
            })),
            create_dog: Arc::new(new_create_dog(authorize_create_dog(), move |dog: Dog| {
                create_store.create_dog(dog)
            })),
            update_dog: Arc::new(new_update_dog(
                authorize_update_dog(),
                move |dog: Dog| update_store.update_dog(dog),
                move |id: Uuid| update_fetch_store.fetch_dog(id),
            )),
            fetch_dogs: Arc::new(new_fetch_dogs(authorize_fetch_dogs(), move || {
                list_store.fetch_dogs()
            })),
        }
    }

    pub fn fetch_dog(&self, ctx: &RequestContext, id: Uuid) -> Result<Dog> {
        (self.fetch_dog)(ctx, id)
    }

    pub fn create_dog(&self, ctx: &RequestContext, dog: Dog) -> Result<Dog> {
        (self.create_dog)(ctx, dog)
    }

    pub fn update_dog(&self, ctx: &RequestContext, dog: Dog) -> Result<Dog> {
        (self.update_dog)(ctx, dog)
    }

    pub fn fetch_dogs(&self, ctx: &RequestContext) -> Result<Dogs> {
        (self.fetch_dogs)(ctx)
    }
}

impl std::fmt::Debug for DogServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DogServices").finish_non_exhaustive()
    }
}
