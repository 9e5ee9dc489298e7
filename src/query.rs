use serde::Deserialize;

/// SQL query builder for the course catalog listing
/// Builds a single parameterized query with filters, sorting, and pagination
pub struct CourseQueryBuilder {
    base_query: String,
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: Option<String>,
    limit: u32,
    offset: u32,
}

impl CourseQueryBuilder {
    /// Creates a new CourseQueryBuilder with default values
    pub fn new() -> Self {
        Self {
            base_query: "SELECT id, title, description, category_id, lecturer_id, price, \
                         rating_avg, view_count, enrollment_count, is_published, created_at \
                         FROM courses"
                .to_string(),
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: None,
            limit: 10,
            offset: 0,
        }
    }

    /// Substring match over titles, case-insensitive
    pub fn add_search_filter(&mut self, search: &str) {
        let idx = self.params.len() + 1;
        self.where_clauses.push(format!("title ILIKE ${}", idx));
        self.params.push(format!("%{}%", search));
    }

    /// Restricts results to a single category
    pub fn add_category_filter(&mut self, category_id: i32) {
        let idx = self.params.len() + 1;
        self.where_clauses.push(format!("category_id = ${}::int", idx));
        self.params.push(category_id.to_string());
    }

    /// Inclusive price bounds; either side may be absent
    pub fn add_price_range(&mut self, min: Option<f64>, max: Option<f64>) {
        if let Some(min_price) = min {
            let idx = self.params.len() + 1;
            self.where_clauses.push(format!("price >= ${}::numeric", idx));
            self.params.push(min_price.to_string());
        }

        if let Some(max_price) = max {
            let idx = self.params.len() + 1;
            self.where_clauses.push(format!("price <= ${}::numeric", idx));
            self.params.push(max_price.to_string());
        }
    }

    /// Restricts results to published courses only
    pub fn published_only(&mut self) {
        self.where_clauses.push("is_published = TRUE".to_string());
    }

    /// Sets the sort order for the query
    pub fn set_sort(&mut self, field: CourseSortField, order: SortOrder) {
        let field_name = match field {
            CourseSortField::Price => "price",
            CourseSortField::Rating => "rating_avg",
            CourseSortField::Created => "created_at",
        };

        let order_str = match order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };

        self.order_clause = Some(format!("{} {}", field_name, order_str));
    }

    /// Sets pagination parameters (page is 1-indexed)
    pub fn set_pagination(&mut self, page: u32, limit: u32) {
        self.limit = limit;
        self.offset = (page - 1) * limit;
    }

    /// Builds the final SQL query string with all parameters
    /// Returns a tuple of (query_string, parameters)
    pub fn build(&self) -> (String, Vec<String>) {
        let mut query = self.base_query.clone();

        if !self.where_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&self.where_clauses.join(" AND "));
        }

        if let Some(ref order) = self.order_clause {
            query.push_str(" ORDER BY ");
            query.push_str(order);
        }

        // LIMIT/OFFSET are validated integers, inlined rather than bound
        query.push_str(&format!(" LIMIT {}", self.limit));
        query.push_str(&format!(" OFFSET {}", self.offset));

        (query, self.params.clone())
    }
}

impl Default for CourseQueryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Query parameters extracted from the HTTP request
#[derive(Debug, Deserialize)]
pub struct CourseQueryParams {
    /// Search term for partial title matching (case-insensitive)
    pub search: Option<String>,
    /// Filter by category id
    pub category_id: Option<i32>,
    /// Minimum price filter (inclusive)
    pub min_price: Option<f64>,
    /// Maximum price filter (inclusive)
    pub max_price: Option<f64>,
    /// Sort field: "price", "rating", or "created"
    pub sort: Option<String>,
    /// Sort order: "asc" or "desc"
    pub order: Option<String>,
    /// Page number (1-indexed, defaults to 1)
    pub page: Option<u32>,
    /// Items per page (defaults to 10)
    pub limit: Option<u32>,
}

/// Sort field options for the course listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CourseSortField {
    Price,
    Rating,
    Created,
}

/// Sort order options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Validated and normalized course query parameters
#[derive(Debug)]
pub struct ValidatedCourseQuery {
    pub search: Option<String>,
    pub category_id: Option<i32>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub sort_field: Option<CourseSortField>,
    pub sort_order: SortOrder,
    pub page: u32,
    pub limit: u32,
}

/// Validation error type for query parameters
#[derive(Debug)]
pub struct QueryValidationError {
    pub message: String,
}

impl std::fmt::Display for QueryValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for QueryValidationError {}

/// Query parameter validator for the course listing
pub struct CourseQueryValidator;

impl CourseQueryValidator {
    /// Validates and normalizes query parameters
    pub fn validate(params: CourseQueryParams) -> Result<ValidatedCourseQuery, QueryValidationError> {
        let search = Self::normalize_string(params.search);

        if let Some(category_id) = params.category_id {
            if category_id <= 0 {
                return Err(QueryValidationError {
                    message: "category_id must be a positive integer".to_string(),
                });
            }
        }

        let min_price = if let Some(price) = params.min_price {
            Self::validate_price(price, "min_price")?;
            Some(price)
        } else {
            None
        };

        let max_price = if let Some(price) = params.max_price {
            Self::validate_price(price, "max_price")?;
            Some(price)
        } else {
            None
        };

        if let (Some(min), Some(max)) = (min_price, max_price) {
            if min > max {
                return Err(QueryValidationError {
                    message: "min_price cannot be greater than max_price".to_string(),
                });
            }
        }

        let sort_field = if let Some(sort_str) = params.sort {
            Some(Self::parse_sort_field(&sort_str)?)
        } else {
            None
        };

        let sort_order = if let Some(order_str) = params.order {
            Self::parse_sort_order(&order_str)?
        } else {
            // Rating sorts show best-first by default
            match sort_field {
                Some(CourseSortField::Rating) => SortOrder::Desc,
                Some(CourseSortField::Created) => SortOrder::Desc,
                _ => SortOrder::Asc,
            }
        };

        let page = match params.page {
            Some(0) => {
                return Err(QueryValidationError {
                    message: "page must be a positive number (greater than 0)".to_string(),
                })
            }
            Some(p) => p,
            None => 1,
        };

        let limit = match params.limit {
            Some(0) => {
                return Err(QueryValidationError {
                    message: "limit must be a positive number (greater than 0)".to_string(),
                })
            }
            Some(l) => l.min(100),
            None => 10,
        };

        Ok(ValidatedCourseQuery {
            search,
            category_id: params.category_id,
            min_price,
            max_price,
            sort_field,
            sort_order,
            page,
            limit,
        })
    }

    /// Normalizes string parameters by trimming whitespace
    fn normalize_string(s: Option<String>) -> Option<String> {
        s.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        })
    }

    fn validate_price(price: f64, param_name: &str) -> Result<(), QueryValidationError> {
        if price < 0.0 {
            return Err(QueryValidationError {
                message: format!("{} must not be negative", param_name),
            });
        }
        if price.is_nan() || price.is_infinite() {
            return Err(QueryValidationError {
                message: format!("{} must be a valid number", param_name),
            });
        }
        Ok(())
    }

    fn parse_sort_field(s: &str) -> Result<CourseSortField, QueryValidationError> {
        match s.to_lowercase().as_str() {
            "price" => Ok(CourseSortField::Price),
            "rating" => Ok(CourseSortField::Rating),
            "created" => Ok(CourseSortField::Created),
            _ => Err(QueryValidationError {
                message: format!(
                    "Invalid sort field '{}'. Must be 'price', 'rating', or 'created'",
                    s
                ),
            }),
        }
    }

    fn parse_sort_order(s: &str) -> Result<SortOrder, QueryValidationError> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(QueryValidationError {
                message: format!("Invalid sort order '{}'. Must be 'asc' or 'desc'", s),
            }),
        }
    }
}
