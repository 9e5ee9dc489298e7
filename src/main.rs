mod auth;
mod db;
mod discounts;
mod error;
mod models;
mod query;
mod settings;
mod validation;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use validator::Validate;

use auth::{AuthService, AuthenticatedUser, Role, TokenRepository, TokenService, UserRepository};
use discounts::{CourseCatalogRepository, DiscountRepository, DiscountService};
use error::ApiError;
use models::{Category, Course, CreateCategory, CreateCourse, UpdateCourse};
use query::{CourseQueryBuilder, CourseQueryParams, CourseQueryValidator};
use settings::SettingsProvider;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        create_course,
        get_courses,
        get_course_by_id,
        update_course,
        delete_course,
        create_category,
        get_categories,
    ),
    components(
        schemas(Course, CreateCourse, UpdateCourse, Category, CreateCategory)
    ),
    tags(
        (name = "courses", description = "Course catalog management endpoints"),
        (name = "categories", description = "Category management endpoints")
    ),
    info(
        title = "LearnHub API",
        version = "1.0.0",
        description = "E-learning marketplace backend: course catalog, categories, and discount engine"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub auth_service: AuthService,
    pub discount_service: DiscountService,
}

impl AppState {
    /// Wire repositories and services around a connection pool
    pub fn new(db: PgPool, jwt_secret: String) -> Self {
        let auth_service = AuthService::new(
            UserRepository::new(db.clone()),
            TokenRepository::new(db.clone()),
            TokenService::new(jwt_secret),
        );

        let discount_service = DiscountService::new(
            DiscountRepository::new(db.clone()),
            CourseCatalogRepository::new(db.clone()),
            Arc::new(SettingsProvider::new(db.clone())),
        );

        Self {
            db,
            auth_service,
            discount_service,
        }
    }
}

/// Handler for POST /api/courses
/// Creates a new course (admin only)
#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourse,
    responses(
        (status = 201, description = "Course created successfully", body = Course),
        (status = 400, description = "Invalid input data"),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Duplicate course title"),
        (status = 500, description = "Internal server error")
    ),
    tag = "courses"
)]
async fn create_course(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCourse>,
) -> Result<(StatusCode, Json<Course>), ApiError> {
    tracing::debug!("Creating new course: {}", payload.title);

    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Only admins may create courses".to_string(),
        ));
    }

    payload.validate()?;

    if db::check_duplicate_course(&state.db, &payload.title).await? {
        tracing::warn!("Attempt to create duplicate course: {}", payload.title);
        return Err(ApiError::Conflict {
            message: format!("Course with title '{}' already exists", payload.title),
        });
    }

    let course = sqlx::query_as::<_, Course>(
        r#"
        INSERT INTO courses (title, description, category_id, lecturer_id, price)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id, title, description, category_id, lecturer_id, price,
                  rating_avg, view_count, enrollment_count, is_published, created_at
        "#,
    )
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(payload.category_id)
    .bind(payload.lecturer_id)
    .bind(payload.price)
    .fetch_one(&state.db)
    .await?;

    tracing::info!("Successfully created course with id: {}", course.id);
    Ok((StatusCode::CREATED, Json(course)))
}

/// Handler for GET /api/courses
/// Lists courses with search, filtering, sorting, and pagination
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "List of courses", body = Vec<Course>),
        (status = 400, description = "Invalid query parameters"),
        (status = 500, description = "Internal server error")
    ),
    tag = "courses"
)]
async fn get_courses(
    Query(params): Query<CourseQueryParams>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Course>>, ApiError> {
    tracing::debug!("Fetching courses with query parameters: {:?}", params);

    let validated = CourseQueryValidator::validate(params)
        .map_err(|_e| ApiError::ValidationError(validator::ValidationErrors::new()))?;

    let mut builder = CourseQueryBuilder::new();

    if let Some(search) = validated.search {
        builder.add_search_filter(&search);
    }
    if let Some(category_id) = validated.category_id {
        builder.add_category_filter(category_id);
    }
    builder.add_price_range(validated.min_price, validated.max_price);
    builder.published_only();

    if let Some(sort_field) = validated.sort_field {
        builder.set_sort(sort_field, validated.sort_order);
    }
    builder.set_pagination(validated.page, validated.limit);

    let (query_str, params) = builder.build();

    let mut query = sqlx::query_as::<_, Course>(&query_str);
    for param in params {
        query = query.bind(param);
    }

    let courses = query.fetch_all(&state.db).await?;

    tracing::debug!("Query returned {} courses", courses.len());
    Ok(Json(courses))
}

/// Handler for GET /api/courses/:id
#[utoipa::path(
    get,
    path = "/api/courses/{id}",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 200, description = "Course found", body = Course),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "courses"
)]
async fn get_course_by_id(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Course>, ApiError> {
    tracing::debug!("Fetching course with id: {}", id);

    let course = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, title, description, category_id, lecturer_id, price,
               rating_avg, view_count, enrollment_count, is_published, created_at
        FROM courses
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| {
        tracing::debug!("Course with id {} not found", id);
        ApiError::NotFound {
            resource: "Course".to_string(),
            id: id.to_string(),
        }
    })?;

    Ok(Json(course))
}

/// Handler for PUT /api/courses/:id
/// Updates an existing course (admin only); partial updates supported
#[utoipa::path(
    put,
    path = "/api/courses/{id}",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    request_body = UpdateCourse,
    responses(
        (status = 200, description = "Course updated successfully", body = Course),
        (status = 400, description = "Invalid input data"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Course not found"),
        (status = 409, description = "Duplicate course title"),
        (status = 500, description = "Internal server error")
    ),
    tag = "courses"
)]
async fn update_course(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateCourse>,
) -> Result<Json<Course>, ApiError> {
    tracing::debug!("Updating course with id: {}", id);

    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Only admins may update courses".to_string(),
        ));
    }

    payload.validate()?;

    // Transaction keeps the duplicate check and the write atomic
    let mut tx = state.db.begin().await?;

    let existing = sqlx::query_as::<_, Course>(
        r#"
        SELECT id, title, description, category_id, lecturer_id, price,
               rating_avg, view_count, enrollment_count, is_published, created_at
        FROM courses
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or_else(|| ApiError::NotFound {
        resource: "Course".to_string(),
        id: id.to_string(),
    })?;

    if let Some(ref new_title) = payload.title {
        if new_title != &existing.title {
            let duplicate_exists: Option<bool> = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM courses WHERE title = $1 AND id != $2)",
            )
            .bind(new_title)
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            if duplicate_exists.unwrap_or(false) {
                tracing::warn!("Attempt to rename course {} to duplicate title: {}", id, new_title);
                return Err(ApiError::Conflict {
                    message: format!("Course with title '{}' already exists", new_title),
                });
            }
        }
    }

    let updated_course = sqlx::query_as::<_, Course>(
        r#"
        UPDATE courses
        SET title = $1,
            description = $2,
            category_id = $3,
            price = $4,
            is_published = $5
        WHERE id = $6
        RETURNING id, title, description, category_id, lecturer_id, price,
                  rating_avg, view_count, enrollment_count, is_published, created_at
        "#,
    )
    .bind(payload.title.unwrap_or(existing.title))
    .bind(payload.description.or(existing.description))
    .bind(payload.category_id.or(existing.category_id))
    .bind(payload.price.unwrap_or(existing.price))
    .bind(payload.is_published.unwrap_or(existing.is_published))
    .bind(id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    tracing::info!("Successfully updated course with id: {}", id);
    Ok(Json(updated_course))
}

/// Handler for DELETE /api/courses/:id
#[utoipa::path(
    delete,
    path = "/api/courses/{id}",
    params(
        ("id" = i32, Path, description = "Course ID")
    ),
    responses(
        (status = 204, description = "Course deleted successfully"),
        (status = 403, description = "Not an admin"),
        (status = 404, description = "Course not found"),
        (status = 500, description = "Internal server error")
    ),
    tag = "courses"
)]
async fn delete_course(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i32>,
) -> Result<StatusCode, ApiError> {
    tracing::debug!("Deleting course with id: {}", id);

    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Only admins may delete courses".to_string(),
        ));
    }

    let result = sqlx::query("DELETE FROM courses WHERE id = $1")
        .bind(id)
        .execute(&state.db)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound {
            resource: "Course".to_string(),
            id: id.to_string(),
        });
    }

    tracing::info!("Successfully deleted course with id: {}", id);
    Ok(StatusCode::NO_CONTENT)
}

/// Handler for POST /api/categories (admin only)
#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategory,
    responses(
        (status = 201, description = "Category created successfully", body = Category),
        (status = 403, description = "Not an admin"),
        (status = 409, description = "Duplicate category name"),
        (status = 500, description = "Internal server error")
    ),
    tag = "categories"
)]
async fn create_category(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(payload): Json<CreateCategory>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    if user.role != Role::Admin {
        return Err(ApiError::Forbidden(
            "Only admins may create categories".to_string(),
        ));
    }

    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
    )
    .bind(&payload.name)
    .fetch_one(&state.db)
    .await
    .map_err(|e| match &e {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => ApiError::Conflict {
            message: format!("Category '{}' already exists", payload.name),
        },
        _ => ApiError::DatabaseError(e),
    })?;

    Ok((StatusCode::CREATED, Json(category)))
}

/// Handler for GET /api/categories
#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "List of categories", body = Vec<Category>),
        (status = 500, description = "Internal server error")
    ),
    tag = "categories"
)]
async fn get_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    let categories =
        sqlx::query_as::<_, Category>("SELECT id, name, created_at FROM categories ORDER BY name")
            .fetch_all(&state.db)
            .await?;

    Ok(Json(categories))
}

/// Creates and configures the application router
fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Auth
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/refresh", post(auth::refresh_handler))
        .route("/api/auth/me", get(auth::me_handler))
        // Course catalog
        .route("/api/courses", post(create_course))
        .route("/api/courses", get(get_courses))
        .route("/api/courses/:id", get(get_course_by_id))
        .route("/api/courses/:id", put(update_course))
        .route("/api/courses/:id", delete(delete_course))
        // Categories
        .route("/api/categories", post(create_category))
        .route("/api/categories", get(get_categories))
        // Discount engine
        .route("/api/discounts", post(discounts::create_discount_handler))
        .route("/api/discounts", get(discounts::list_discounts_handler))
        .route("/api/discounts/preview", post(discounts::preview_discount_handler))
        .route(
            "/api/discounts/available",
            post(discounts::available_discounts_handler),
        )
        .route("/api/discounts/:id", get(discounts::get_discount_handler))
        .route("/api/discounts/:id", put(discounts::update_discount_handler))
        .route(
            "/api/discounts/:id/toggle",
            post(discounts::toggle_discount_handler),
        )
        .route(
            "/api/discounts/:id",
            delete(discounts::delete_discount_handler),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .init();

    tracing::info!("LearnHub API - Starting...");

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    let state = AppState::new(db_pool, jwt_secret);
    let app = create_router(state);

    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("LearnHub API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}
