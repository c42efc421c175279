//! GraphQL API
//!
//! Query and mutation resolvers over the same authorized dog services the
//! REST handlers use.
//!
//! Endpoints:
//! - POST /api/graph/query - Execute GraphQL queries/mutations
//! - GET /api/graph/playground - GraphiQL playground

use async_graphql::{
    Context, EmptySubscription, Enum, ErrorExtensions, InputObject, Object, Result as GqlResult,
    Schema, SimpleObject, ID,
};
use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::{
    extract::State,
    response::{Html, IntoResponse},
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::AppState;
use crate::context::RequestContext;
use crate::error::{AppError, ContextError, Resource, ValidationError};
use crate::models::{Dog, DogBreed, DogInput};
use crate::services::DogServices;

// == GraphQL Types ==

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[graphql(name = "Breed")]
pub enum GqlBreed {
    Chihuahua,
}

impl From<DogBreed> for GqlBreed {
    fn from(breed: DogBreed) -> Self {
        match breed {
            DogBreed::Chihuahua => GqlBreed::Chihuahua,
        }
    }
}

impl From<GqlBreed> for DogBreed {
    fn from(breed: GqlBreed) -> Self {
        match breed {
            GqlBreed::Chihuahua => DogBreed::Chihuahua,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Owner")]
pub struct GqlOwner {
    pub id: ID,
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Dog")]
pub struct GqlDog {
    pub id: ID,
    pub name: String,
    pub breed: GqlBreed,
    pub birth_date: DateTime<Utc>,
    pub owner: GqlOwner,
}

impl From<Dog> for GqlDog {
    fn from(dog: Dog) -> Self {
        Self {
            id: ID(dog.id.to_string()),
            name: dog.name,
            breed: dog.breed.into(),
            birth_date: dog.birth_date,
            owner: GqlOwner {
                id: ID(dog.owner_id),
            },
        }
    }
}

#[derive(Debug, Clone, InputObject)]
#[graphql(name = "DogInput")]
pub struct GqlDogInput {
    pub name: String,
    pub breed: GqlBreed,
    pub birth_date: DateTime<Utc>,
}

impl From<GqlDogInput> for DogInput {
    fn from(input: GqlDogInput) -> Self {
        Self {
            name: input.name,
            breed: input.breed.into(),
            birth_date: input.birth_date,
        }
    }
}

// == Resolver Helpers ==

/// Renders a classified error as a GraphQL error carrying the HTTP
/// equivalent status as its `code` extension.
fn gql_error(err: AppError, ctx: &RequestContext) -> async_graphql::Error {
    err.record(ctx);
    let code = i32::from(err.status_code().as_u16());
    let trace_id = ctx.trace_id().to_string();
    async_graphql::Error::new(err.public_message()).extend_with(|_, ext| {
        ext.set("code", code);
        ext.set("traceID", trace_id);
    })
}

fn deps<'a>(ctx: &Context<'a>) -> GqlResult<(&'a DogServices, &'a RequestContext)> {
    let rctx = ctx
        .data::<RequestContext>()
        .map_err(|_| gql_error(ContextError::missing_logger().into(), &RequestContext::new()))?;
    let services = ctx
        .data::<DogServices>()
        .map_err(|err| gql_error(anyhow::anyhow!(err.message).into(), rctx))?;
    Ok((services, rctx))
}

fn parse_id(id: &ID, reason: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.as_str()).map_err(|_| {
        ValidationError::new(reason, Resource::Dog, id.as_str())
            .with_validation("id", "must be UUID")
            .into()
    })
}

fn validated(input: GqlDogInput, resource_id: &str) -> Result<DogInput, AppError> {
    let input = DogInput::from(input);
    match input.validate(resource_id) {
        Some(err) => Err(err.into()),
        None => Ok(input),
    }
}

// == Query Root ==

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Every dog, for any identified caller.
    async fn dogs(&self, ctx: &Context<'_>) -> GqlResult<Vec<GqlDog>> {
        let (services, rctx) = deps(ctx)?;
        services
            .fetch_dogs(rctx)
            .map(|dogs| dogs.into_iter().map(GqlDog::from).collect())
            .map_err(|err| gql_error(err, rctx))
    }

    /// One of the caller's dogs.
    async fn dog(&self, ctx: &Context<'_>, id: ID) -> GqlResult<GqlDog> {
        let (services, rctx) = deps(ctx)?;
        parse_id(&id, "dog query failed validation")
            .and_then(|id| services.fetch_dog(rctx, id))
            .map(GqlDog::from)
            .map_err(|err| gql_error(err, rctx))
    }
}

// == Mutation Root ==

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn create_dog(&self, ctx: &Context<'_>, input: GqlDogInput) -> GqlResult<GqlDog> {
        let (services, rctx) = deps(ctx)?;
        validated(input, "")
            .and_then(|input| services.create_dog(rctx, input.into_dog()))
            .map(GqlDog::from)
            .map_err(|err| gql_error(err, rctx))
    }

    async fn update_dog(
        &self,
        ctx: &Context<'_>,
        id: ID,
        input: GqlDogInput,
    ) -> GqlResult<GqlDog> {
        let (services, rctx) = deps(ctx)?;
        parse_id(&id, "updateDog failed validation")
            .and_then(|dog_id| {
                let input = validated(input, id.as_str())?;
                services.update_dog(rctx, input.into_dog_with_id(dog_id))
            })
            .map(GqlDog::from)
            .map_err(|err| gql_error(err, rctx))
    }
}

// == Schema ==

pub type BorkSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// Create the GraphQL schema.
pub fn create_schema(services: DogServices) -> BorkSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(services)
        .finish()
}

/// Handler for GraphQL requests. The request context travels into the
/// resolvers as request data.
pub async fn graphql_handler(
    State(state): State<AppState>,
    ctx: RequestContext,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let request = req.into_inner().data(ctx);
    state.schema.execute(request).await.into()
}

/// Handler for GraphiQL playground.
pub async fn graphiql_handler() -> impl IntoResponse {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/api/graph/query")
            .finish(),
    )
}
