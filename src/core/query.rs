//! Query builder - Renders parameterized filter and aggregate queries from descriptors.
//!
//! Every table, column and join is resolved through [`crate::core::schema`] before any SQL
//! is produced, and every filter value is bound as a parameter. Listing views, lookups of
//! distinct values and all reports go through [`QuerySpec::build`].

use crate::{
    core::schema::{self, Cardinality, EntityKind},
    errors::{Error, Result},
};
use sea_orm::sea_query::{Alias, Asterisk, Expr, Func, JoinType, Order, Query, SimpleExpr};
use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement, Value};
use std::collections::HashSet;
use tracing::debug;

/// Reference to a field on one of the entities in scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    /// Entity declaring the field
    pub entity: EntityKind,
    /// Column name
    pub name: String,
}

impl FieldRef {
    /// Creates a field reference; validity is checked when the query is built.
    pub fn new(entity: EntityKind, name: impl Into<String>) -> Self {
        Self {
            entity,
            name: name.into(),
        }
    }
}

/// Comparison applied by a filter.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Field equals the value
    Equals(Value),
    /// Field equals any of the values; an empty set matches nothing
    InSet(Vec<Value>),
}

/// A single `field <op> value` condition. Filters are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    /// Field being compared
    pub field: FieldRef,
    /// Operator and bound value(s)
    pub predicate: Predicate,
}

impl Filter {
    /// `field = value`
    pub fn equals(field: FieldRef, value: impl Into<Value>) -> Self {
        Self {
            field,
            predicate: Predicate::Equals(value.into()),
        }
    }

    /// `field IN (values...)`
    pub fn in_set<V, I>(field: FieldRef, values: I) -> Self
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        Self {
            field,
            predicate: Predicate::InSet(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Number of parameters this filter binds.
    #[must_use]
    pub fn value_count(&self) -> usize {
        match &self.predicate {
            Predicate::Equals(_) => 1,
            Predicate::InSet(values) => values.len(),
        }
    }
}

/// SQL join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// Keep only rows with a match on both sides
    Inner,
    /// Keep every row of the entities already in scope
    Left,
}

/// Request to traverse a declared relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinSpec {
    /// Entity already in scope
    pub from: EntityKind,
    /// Entity to bring into scope
    pub to: EntityKind,
    /// Join flavour
    pub kind: JoinKind,
}

impl JoinSpec {
    /// Inner join from `from` to `to`.
    #[must_use]
    pub const fn inner(from: EntityKind, to: EntityKind) -> Self {
        Self {
            from,
            to,
            kind: JoinKind::Inner,
        }
    }

    /// Left join from `from` to `to`.
    #[must_use]
    pub const fn left(from: EntityKind, to: EntityKind) -> Self {
        Self {
            from,
            to,
            kind: JoinKind::Left,
        }
    }
}

/// Aggregate function applied to the grouped rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// `COUNT(*)` or `COUNT(field)` (non-null values)
    Count,
    /// `SUM(field)`; NULL when no rows contribute
    Sum,
    /// `AVG(field)`
    Avg,
}

impl AggregateFunction {
    const fn name(self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest first
    Asc,
    /// Largest first
    Desc,
}

impl From<SortOrder> for Order {
    fn from(value: SortOrder) -> Self {
        match value {
            SortOrder::Asc => Self::Asc,
            SortOrder::Desc => Self::Desc,
        }
    }
}

/// A projected column, output under `alias` (or the field name when absent).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputColumn {
    /// Field to output
    pub field: FieldRef,
    /// Output column name
    pub alias: Option<String>,
}

/// A grouping key. Keys without an alias group rows but are not output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupKey {
    /// Field to group by
    pub field: FieldRef,
    /// Output column name, if the key is selected
    pub alias: Option<String>,
}

/// Grouping and aggregate applied to the filtered, joined rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Aggregation {
    /// Grouping keys; empty aggregates over all rows
    pub group_by: Vec<GroupKey>,
    /// Aggregate function
    pub function: AggregateFunction,
    /// Aggregated field; required for `Sum` and `Avg`, `None` means `COUNT(*)`
    pub target: Option<FieldRef>,
    /// Output column name of the aggregate
    pub alias: String,
    /// Sort by the aggregate; ties and unsorted output fall back to group keys ascending
    pub order: Option<SortOrder>,
    /// Maximum number of groups returned
    pub limit: Option<u64>,
}

impl Aggregation {
    fn new(function: AggregateFunction, target: Option<FieldRef>, alias: &str) -> Self {
        Self {
            group_by: Vec::new(),
            function,
            target,
            alias: alias.to_string(),
            order: None,
            limit: None,
        }
    }

    /// `COUNT(*)` output as `alias`.
    #[must_use]
    pub fn count(alias: &str) -> Self {
        Self::new(AggregateFunction::Count, None, alias)
    }

    /// `COUNT(target)` output as `alias`.
    #[must_use]
    pub fn count_of(target: FieldRef, alias: &str) -> Self {
        Self::new(AggregateFunction::Count, Some(target), alias)
    }

    /// `SUM(target)` output as `alias`.
    #[must_use]
    pub fn sum(target: FieldRef, alias: &str) -> Self {
        Self::new(AggregateFunction::Sum, Some(target), alias)
    }

    /// `AVG(target)` output as `alias`.
    #[must_use]
    pub fn avg(target: FieldRef, alias: &str) -> Self {
        Self::new(AggregateFunction::Avg, Some(target), alias)
    }

    /// Groups by `field` and outputs it as `alias`.
    #[must_use]
    pub fn group_by(mut self, field: FieldRef, alias: &str) -> Self {
        self.group_by.push(GroupKey {
            field,
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Groups by `field` without outputting it.
    #[must_use]
    pub fn group_by_hidden(mut self, field: FieldRef) -> Self {
        self.group_by.push(GroupKey { field, alias: None });
        self
    }

    /// Sorts groups by the aggregate value.
    #[must_use]
    pub const fn order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    /// Caps the number of groups returned.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Declarative description of a query over one base entity.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    /// Entity the query starts from
    pub base: EntityKind,
    /// AND-combined conditions
    pub filters: Vec<Filter>,
    /// Relationships to traverse, in order
    pub joins: Vec<JoinSpec>,
    /// Projection for non-aggregate queries; empty selects every base column
    pub columns: Vec<OutputColumn>,
    /// Sort keys for non-aggregate queries
    pub order_by: Vec<(FieldRef, SortOrder)>,
    /// Row cap for non-aggregate queries
    pub limit: Option<u64>,
    /// Grouping and aggregate, if any
    pub aggregation: Option<Aggregation>,
}

impl QuerySpec {
    /// Starts a query matching every row of `base`.
    #[must_use]
    pub const fn new(base: EntityKind) -> Self {
        Self {
            base,
            filters: Vec::new(),
            joins: Vec::new(),
            columns: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            aggregation: None,
        }
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    /// Adds a join.
    #[must_use]
    pub fn join(mut self, join: JoinSpec) -> Self {
        self.joins.push(join);
        self
    }

    /// Adds a projected column.
    #[must_use]
    pub fn column(mut self, field: FieldRef, alias: &str) -> Self {
        self.columns.push(OutputColumn {
            field,
            alias: Some(alias.to_string()),
        });
        self
    }

    /// Adds a sort key.
    #[must_use]
    pub fn order_by(mut self, field: FieldRef, order: SortOrder) -> Self {
        self.order_by.push((field, order));
        self
    }

    /// Caps the number of rows.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the aggregation.
    #[must_use]
    pub fn aggregate(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = Some(aggregation);
        self
    }

    /// Validates the descriptor and renders it for `backend`.
    ///
    /// Nothing is executed. Parameters are ordered as the filters are, followed by the
    /// row limit when one is set.
    ///
    /// # Errors
    /// * `Error::InvalidJoin` - a join has no declared foreign key, starts outside the
    ///   entities in scope, or targets an entity already joined
    /// * `Error::UnknownField` - a field is not declared on an entity in scope
    /// * `Error::InvalidAggregation` - the aggregation is incomplete or inconsistent
    /// * `Error::FanOut` - an aggregate target would be double counted by a one-to-many join
    pub fn build(&self, backend: DbBackend) -> Result<BuiltQuery> {
        let mut select = Query::select();
        select.from(table(self.base));

        let mut scope = vec![self.base];
        let mut multiplied: HashSet<EntityKind> = HashSet::new();

        for join in &self.joins {
            if !scope.contains(&join.from) {
                return Err(Error::InvalidJoin {
                    from: join.from,
                    to: join.to,
                    reason: "source entity is not in scope",
                });
            }
            if scope.contains(&join.to) {
                return Err(Error::InvalidJoin {
                    from: join.from,
                    to: join.to,
                    reason: "target entity is already in scope",
                });
            }
            let relationship =
                schema::relationship(join.from, join.to).ok_or(Error::InvalidJoin {
                    from: join.from,
                    to: join.to,
                    reason: "no declared foreign key",
                })?;

            // Every row already in scope repeats once per matching child row.
            if relationship.cardinality == Cardinality::OneToMany {
                multiplied.extend(scope.iter().copied());
            }

            let condition = Expr::col((table(relationship.child), Alias::new(relationship.column)))
                .equals((
                    table(relationship.parent),
                    Alias::new(relationship.parent.primary_key()),
                ));
            let join_type = match join.kind {
                JoinKind::Inner => JoinType::InnerJoin,
                JoinKind::Left => JoinType::LeftJoin,
            };
            select.join(join_type, table(join.to), condition);
            scope.push(join.to);
        }

        for filter in &self.filters {
            let column = column_ref(&scope, &filter.field)?;
            let condition = match &filter.predicate {
                Predicate::Equals(value) => Expr::col(column).eq(value.clone()),
                // An empty set matches nothing and binds no parameters.
                Predicate::InSet(values) if values.is_empty() => Expr::cust("1 = 0"),
                Predicate::InSet(values) => Expr::col(column).is_in(values.iter().cloned()),
            };
            select.and_where(condition);
        }

        if let Some(aggregation) = &self.aggregation {
            if !self.columns.is_empty() || !self.order_by.is_empty() {
                return Err(Error::InvalidAggregation {
                    message: "projection and sort keys are derived from the aggregation"
                        .to_string(),
                });
            }
            if aggregation.alias.is_empty() {
                return Err(Error::InvalidAggregation {
                    message: "aggregate alias must not be empty".to_string(),
                });
            }

            let mut group_columns = Vec::with_capacity(aggregation.group_by.len());
            for key in &aggregation.group_by {
                let column = column_ref(&scope, &key.field)?;
                if let Some(alias) = &key.alias {
                    if alias == &aggregation.alias {
                        return Err(Error::InvalidAggregation {
                            message: format!("alias `{alias}` is used twice"),
                        });
                    }
                    select.expr_as(Expr::col(column.clone()), Alias::new(alias));
                }
                select.group_by_col(column.clone());
                group_columns.push(column);
            }

            let aggregate: SimpleExpr = match &aggregation.target {
                None if aggregation.function == AggregateFunction::Count => {
                    Func::count(Expr::col(Asterisk)).into()
                }
                None => {
                    return Err(Error::InvalidAggregation {
                        message: format!("{} requires a target field", aggregation.function.name()),
                    });
                }
                Some(target) => {
                    let column = column_ref(&scope, target)?;
                    if multiplied.contains(&target.entity) {
                        return Err(Error::FanOut {
                            entity: target.entity,
                        });
                    }
                    match aggregation.function {
                        AggregateFunction::Count => Func::count(Expr::col(column)).into(),
                        AggregateFunction::Sum => Func::sum(Expr::col(column)).into(),
                        AggregateFunction::Avg => Func::avg(Expr::col(column)).into(),
                    }
                }
            };
            select.expr_as(aggregate, Alias::new(&aggregation.alias));

            if let Some(order) = aggregation.order {
                select.order_by_expr(Expr::col(Alias::new(&aggregation.alias)).into(), order.into());
            }
            for column in group_columns {
                select.order_by(column, Order::Asc);
            }
            if let Some(limit) = aggregation.limit.or(self.limit) {
                select.limit(limit);
            }
        } else {
            if self.columns.is_empty() {
                for field in self.base.fields() {
                    select.column((table(self.base), Alias::new(field.name)));
                }
            }
            for output in &self.columns {
                let column = column_ref(&scope, &output.field)?;
                let alias = output.alias.as_deref().unwrap_or(&output.field.name);
                select.expr_as(Expr::col(column), Alias::new(alias));
            }
            for (field, order) in &self.order_by {
                select.order_by(column_ref(&scope, field)?, (*order).into());
            }
            if let Some(limit) = self.limit {
                select.limit(limit);
            }
        }

        let statement = backend.build(&select);
        let built = BuiltQuery {
            sql: statement.sql,
            params: statement.values.map(|values| values.0).unwrap_or_default(),
            backend,
        };
        debug!(sql = %built.sql, params = built.params.len(), "Built query");
        Ok(built)
    }
}

/// Renders a query from its parts without a projection, sort keys or row cap.
///
/// Equivalent to assembling a [`QuerySpec`] and calling [`QuerySpec::build`]. An empty
/// filter list is valid and matches every row.
///
/// # Errors
/// See [`QuerySpec::build`].
pub fn build_query(
    backend: DbBackend,
    base: EntityKind,
    filters: &[Filter],
    joins: &[JoinSpec],
    aggregation: Option<&Aggregation>,
) -> Result<BuiltQuery> {
    QuerySpec {
        filters: filters.to_vec(),
        joins: joins.to_vec(),
        aggregation: aggregation.cloned(),
        ..QuerySpec::new(base)
    }
    .build(backend)
}

/// A rendered statement and its bound parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct BuiltQuery {
    /// Statement text with placeholders only
    pub sql: String,
    /// Bound parameters
    pub params: Vec<Value>,
    backend: DbBackend,
}

impl BuiltQuery {
    /// Converts into a statement ready for the storage collaborator.
    #[must_use]
    pub fn into_statement(self) -> Statement {
        Statement::from_sql_and_values(self.backend, self.sql, self.params)
    }

    /// Executes the query and maps each row into `T` by output column name.
    pub async fn fetch_all<T, C>(self, db: &C) -> Result<Vec<T>>
    where
        T: FromQueryResult,
        C: ConnectionTrait,
    {
        T::find_by_statement(self.into_statement())
            .all(db)
            .await
            .map_err(Into::into)
    }

    /// Executes the query and maps the first row into `T`, if any.
    pub async fn fetch_one<T, C>(self, db: &C) -> Result<Option<T>>
    where
        T: FromQueryResult,
        C: ConnectionTrait,
    {
        T::find_by_statement(self.into_statement())
            .one(db)
            .await
            .map_err(Into::into)
    }
}

#[derive(Debug, FromQueryResult)]
struct DistinctValue {
    value: String,
}

/// Returns the distinct values of a text field, sorted ascending.
///
/// Used to populate filter choices such as cities, provider types and food types.
///
/// # Errors
/// Returns `Error::UnknownField` for an undeclared field and `Error::Validation` for a
/// field that is not text.
pub async fn distinct_values<C>(db: &C, field: FieldRef) -> Result<Vec<String>>
where
    C: ConnectionTrait,
{
    let definition = field.entity.field(&field.name).ok_or(Error::UnknownField {
        entity: field.entity,
        field: field.name.clone(),
    })?;
    if definition.field_type != schema::FieldType::Text {
        return Err(Error::Validation {
            message: format!("{}.{} is not a text field", field.entity, field.name),
        });
    }

    let rows: Vec<DistinctValue> = QuerySpec::new(field.entity)
        .aggregate(Aggregation::count("occurrences").group_by(field, "value"))
        .build(db.get_database_backend())?
        .fetch_all(db)
        .await?;

    Ok(rows.into_iter().map(|row| row.value).collect())
}

fn table(entity: EntityKind) -> Alias {
    Alias::new(entity.table_name())
}

fn column_ref(scope: &[EntityKind], field: &FieldRef) -> Result<(Alias, Alias)> {
    if !scope.contains(&field.entity) || field.entity.field(&field.name).is_none() {
        return Err(Error::UnknownField {
            entity: field.entity,
            field: field.name.clone(),
        });
    }
    Ok((table(field.entity), Alias::new(&field.name)))
}
