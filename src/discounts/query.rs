// Listing query support for the discount catalog
//
// Mirrors the course catalog's parameterized-builder approach with the
// discount-specific filters: free-text search over name/code, scope, amount
// kind, active flag, validity bucket, and an expanded sort column set.

use serde::Deserialize;

use crate::discounts::error::DiscountError;
use crate::discounts::models::{AmountKind, ScopeKind};

const DISCOUNT_COLUMNS: &str = "id, name, description, code, is_hidden, created_by, \
    creator_role, scope, percent_value, fixed_value, usage_limit, per_user_limit, \
    starts_at, ends_at, usage_count, is_active, created_at, updated_at";

/// Which slice of the validity window a discount is in right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidityBucket {
    Expired,
    Running,
    Upcoming,
}

impl ValidityBucket {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "expired" => Ok(ValidityBucket::Expired),
            "running" => Ok(ValidityBucket::Running),
            "upcoming" => Ok(ValidityBucket::Upcoming),
            _ => Err(format!("Invalid validity bucket: {}", s)),
        }
    }
}

/// Sortable columns of the discount listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscountSortField {
    Name,
    Code,
    Scope,
    AmountKind,
    UsageCount,
    StartsAt,
    EndsAt,
    CreatedAt,
}

impl DiscountSortField {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "name" => Ok(DiscountSortField::Name),
            "code" => Ok(DiscountSortField::Code),
            "scope" => Ok(DiscountSortField::Scope),
            "amount_kind" => Ok(DiscountSortField::AmountKind),
            "usage_count" => Ok(DiscountSortField::UsageCount),
            "starts_at" => Ok(DiscountSortField::StartsAt),
            "ends_at" => Ok(DiscountSortField::EndsAt),
            "created_at" => Ok(DiscountSortField::CreatedAt),
            _ => Err(format!("Invalid sort field: {}", s)),
        }
    }

    fn column(&self) -> &'static str {
        match self {
            DiscountSortField::Name => "name",
            DiscountSortField::Code => "code",
            DiscountSortField::Scope => "scope",
            // Percent rows sort before fixed rows (or after, descending)
            DiscountSortField::AmountKind => "(percent_value IS NULL)",
            DiscountSortField::UsageCount => "usage_count",
            DiscountSortField::StartsAt => "starts_at",
            DiscountSortField::EndsAt => "ends_at",
            DiscountSortField::CreatedAt => "created_at",
        }
    }
}

/// Raw query parameters for GET /api/discounts
#[derive(Debug, Default, Deserialize)]
pub struct DiscountListParams {
    /// Substring search over name and code (case-insensitive)
    pub search: Option<String>,
    /// Scope kind filter: "global", "course", or "category"
    pub scope: Option<String>,
    /// Amount kind filter: "percent" or "fixed"
    pub amount_kind: Option<String>,
    /// Active flag filter
    pub active: Option<bool>,
    /// Validity bucket filter: "expired", "running", or "upcoming"
    pub validity: Option<String>,
    /// Sort column (defaults to created_at)
    pub sort: Option<String>,
    /// Sort order: "asc" or "desc" (defaults to desc)
    pub order: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

/// Validated listing parameters
#[derive(Debug)]
pub struct ValidatedDiscountQuery {
    pub search: Option<String>,
    pub scope: Option<ScopeKind>,
    pub amount_kind: Option<AmountKind>,
    pub active: Option<bool>,
    pub validity: Option<ValidityBucket>,
    pub sort_field: DiscountSortField,
    pub descending: bool,
    pub page: u32,
    pub page_size: u32,
}

impl ValidatedDiscountQuery {
    /// Validate and normalize raw listing parameters
    pub fn from_params(params: DiscountListParams) -> Result<Self, DiscountError> {
        let search = params.search.and_then(|s| {
            let trimmed = s.trim().to_string();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed)
            }
        });

        let scope = params
            .scope
            .map(|s| ScopeKind::from_str(&s))
            .transpose()
            .map_err(DiscountError::ValidationError)?;

        let amount_kind = params
            .amount_kind
            .map(|s| AmountKind::from_str(&s))
            .transpose()
            .map_err(DiscountError::ValidationError)?;

        let validity = params
            .validity
            .map(|s| ValidityBucket::from_str(&s))
            .transpose()
            .map_err(DiscountError::ValidationError)?;

        let sort_field = params
            .sort
            .map(|s| DiscountSortField::from_str(&s))
            .transpose()
            .map_err(DiscountError::ValidationError)?
            .unwrap_or(DiscountSortField::CreatedAt);

        let descending = match params.order.as_deref() {
            None => true,
            Some(s) => match s.to_lowercase().as_str() {
                "asc" => false,
                "desc" => true,
                other => {
                    return Err(DiscountError::ValidationError(format!(
                        "Invalid sort order '{}'. Must be 'asc' or 'desc'",
                        other
                    )))
                }
            },
        };

        let page = match params.page {
            Some(0) => {
                return Err(DiscountError::ValidationError(
                    "page must be a positive number (greater than 0)".to_string(),
                ))
            }
            Some(p) => p,
            None => 1,
        };

        let page_size = match params.page_size {
            Some(0) => {
                return Err(DiscountError::ValidationError(
                    "page_size must be a positive number (greater than 0)".to_string(),
                ))
            }
            Some(l) => l.min(100),
            None => 20,
        };

        Ok(Self {
            search,
            scope,
            amount_kind,
            active: params.active,
            validity,
            sort_field,
            descending,
            page,
            page_size,
        })
    }
}

/// Who the listing is scoped to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingScope {
    /// Admin listings show admin-authored discounts
    AdminAuthored,
    /// Lecturer listings show only the lecturer's own discounts
    OwnedBy(i32),
}

/// Parameterized SQL builder for the discount listing
pub struct DiscountQueryBuilder {
    where_clauses: Vec<String>,
    params: Vec<String>,
    order_clause: String,
    limit: u32,
    offset: u32,
}

impl DiscountQueryBuilder {
    /// Build a query from validated parameters and a role scoping rule
    pub fn from_query(query: &ValidatedDiscountQuery, listing_scope: ListingScope) -> Self {
        let mut builder = Self {
            where_clauses: Vec::new(),
            params: Vec::new(),
            order_clause: format!(
                "{} {}",
                query.sort_field.column(),
                if query.descending { "DESC" } else { "ASC" }
            ),
            limit: query.page_size,
            offset: (query.page - 1) * query.page_size,
        };

        match listing_scope {
            ListingScope::AdminAuthored => {
                builder.where_clauses.push("creator_role = 'admin'".to_string());
            }
            ListingScope::OwnedBy(user_id) => {
                let idx = builder.params.len() + 1;
                builder
                    .where_clauses
                    .push(format!("created_by = ${}::int", idx));
                builder.params.push(user_id.to_string());
            }
        }

        if let Some(ref search) = query.search {
            let idx = builder.params.len() + 1;
            builder.where_clauses.push(format!(
                "(name ILIKE ${} OR code ILIKE ${})",
                idx, idx
            ));
            builder.params.push(format!("%{}%", search));
        }

        if let Some(scope) = query.scope {
            let idx = builder.params.len() + 1;
            builder.where_clauses.push(format!("scope = ${}", idx));
            builder.params.push(scope.as_str().to_string());
        }

        if let Some(amount_kind) = query.amount_kind {
            let clause = match amount_kind {
                AmountKind::Percent => "percent_value IS NOT NULL",
                AmountKind::Fixed => "fixed_value IS NOT NULL",
            };
            builder.where_clauses.push(clause.to_string());
        }

        if let Some(active) = query.active {
            builder
                .where_clauses
                .push(format!("is_active = {}", if active { "TRUE" } else { "FALSE" }));
        }

        if let Some(bucket) = query.validity {
            let clause = match bucket {
                ValidityBucket::Expired => "ends_at < NOW()",
                ValidityBucket::Running => "starts_at <= NOW() AND ends_at >= NOW()",
                ValidityBucket::Upcoming => "starts_at > NOW()",
            };
            builder.where_clauses.push(clause.to_string());
        }

        builder
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Final SELECT with filters, ordering, and pagination
    pub fn build(&self) -> (String, Vec<String>) {
        let query = format!(
            "SELECT {} FROM discounts{} ORDER BY {} LIMIT {} OFFSET {}",
            DISCOUNT_COLUMNS,
            self.where_sql(),
            self.order_clause,
            self.limit,
            self.offset
        );

        (query, self.params.clone())
    }

    /// Matching COUNT(*) for the same filters
    pub fn build_count(&self) -> (String, Vec<String>) {
        let query = format!("SELECT COUNT(*) FROM discounts{}", self.where_sql());
        (query, self.params.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_query() -> ValidatedDiscountQuery {
        ValidatedDiscountQuery::from_params(DiscountListParams::default()).unwrap()
    }

    #[test]
    fn test_defaults() {
        let query = default_query();
        assert_eq!(query.page, 1);
        assert_eq!(query.page_size, 20);
        assert_eq!(query.sort_field, DiscountSortField::CreatedAt);
        assert!(query.descending);
    }

    #[test]
    fn test_admin_scoping() {
        let builder = DiscountQueryBuilder::from_query(&default_query(), ListingScope::AdminAuthored);
        let (sql, params) = builder.build();

        assert!(sql.contains("creator_role = 'admin'"));
        assert!(sql.contains("ORDER BY created_at DESC"));
        assert!(sql.contains("LIMIT 20 OFFSET 0"));
        assert!(params.is_empty());
    }

    #[test]
    fn test_lecturer_scoping() {
        let builder = DiscountQueryBuilder::from_query(&default_query(), ListingScope::OwnedBy(42));
        let (sql, params) = builder.build();

        assert!(sql.contains("created_by = $1::int"));
        assert_eq!(params, vec!["42".to_string()]);
    }

    #[test]
    fn test_search_covers_name_and_code() {
        let query = ValidatedDiscountQuery::from_params(DiscountListParams {
            search: Some("spring".to_string()),
            ..Default::default()
        })
        .unwrap();

        let builder = DiscountQueryBuilder::from_query(&query, ListingScope::AdminAuthored);
        let (sql, params) = builder.build();

        assert!(sql.contains("(name ILIKE $1 OR code ILIKE $1)"));
        assert_eq!(params, vec!["%spring%".to_string()]);
    }

    #[test]
    fn test_amount_kind_filter() {
        let query = ValidatedDiscountQuery::from_params(DiscountListParams {
            amount_kind: Some("percent".to_string()),
            ..Default::default()
        })
        .unwrap();

        let builder = DiscountQueryBuilder::from_query(&query, ListingScope::AdminAuthored);
        let (sql, _) = builder.build();

        assert!(sql.contains("percent_value IS NOT NULL"));
    }

    #[test]
    fn test_validity_buckets() {
        for (bucket, expected) in [
            ("expired", "ends_at < NOW()"),
            ("running", "starts_at <= NOW() AND ends_at >= NOW()"),
            ("upcoming", "starts_at > NOW()"),
        ] {
            let query = ValidatedDiscountQuery::from_params(DiscountListParams {
                validity: Some(bucket.to_string()),
                ..Default::default()
            })
            .unwrap();

            let builder = DiscountQueryBuilder::from_query(&query, ListingScope::AdminAuthored);
            let (sql, _) = builder.build();
            assert!(sql.contains(expected), "bucket {} missing clause", bucket);
        }
    }

    #[test]
    fn test_count_query_shares_filters() {
        let query = ValidatedDiscountQuery::from_params(DiscountListParams {
            search: Some("sale".to_string()),
            active: Some(true),
            ..Default::default()
        })
        .unwrap();

        let builder = DiscountQueryBuilder::from_query(&query, ListingScope::OwnedBy(7));
        let (count_sql, count_params) = builder.build_count();

        assert!(count_sql.starts_with("SELECT COUNT(*)"));
        assert!(count_sql.contains("is_active = TRUE"));
        assert!(!count_sql.contains("ORDER BY"));
        assert!(!count_sql.contains("LIMIT"));
        assert_eq!(count_params.len(), 2);
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        assert!(ValidatedDiscountQuery::from_params(DiscountListParams {
            scope: Some("bundle".to_string()),
            ..Default::default()
        })
        .is_err());

        assert!(ValidatedDiscountQuery::from_params(DiscountListParams {
            order: Some("sideways".to_string()),
            ..Default::default()
        })
        .is_err());

        assert!(ValidatedDiscountQuery::from_params(DiscountListParams {
            page: Some(0),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_page_size_capped() {
        let query = ValidatedDiscountQuery::from_params(DiscountListParams {
            page_size: Some(10_000),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(query.page_size, 100);
    }
}
