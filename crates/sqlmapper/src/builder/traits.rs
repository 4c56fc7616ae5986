use super::column::Column;
use super::select::QueryBuilder;
use super::where_builder::{ConditionBuilder, Junction, SubQuery};
use crate::value::Value;

/// Predicate methods shared by every builder.
///
/// Each method comes in two forms: `eq(col, v)` and `eq_if(gate, col, v)`.
/// A `false` gate makes the call a no-op. Every call returns the same
/// builder, so calls chain.
///
/// Columns are field names, column names, typed [`Field`](crate::Field)s or
/// function calls such as `COUNT(*)`.
pub trait Conditions: Sized {
    type Entity: 'static;

    #[doc(hidden)]
    fn conditions(&mut self) -> &mut ConditionBuilder<Self::Entity>;

    // ==================== Comparison ====================

    fn eq(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.eq_if(true, col, value)
    }

    fn eq_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_compare(gate, col.into(), "=", value.into());
        self
    }

    fn ne(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.ne_if(true, col, value)
    }

    fn ne_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_compare(gate, col.into(), "!=", value.into());
        self
    }

    fn gt(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.gt_if(true, col, value)
    }

    fn gt_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_compare(gate, col.into(), ">", value.into());
        self
    }

    fn ge(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.ge_if(true, col, value)
    }

    fn ge_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_compare(gate, col.into(), ">=", value.into());
        self
    }

    fn lt(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.lt_if(true, col, value)
    }

    fn lt_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_compare(gate, col.into(), "<", value.into());
        self
    }

    fn le(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.le_if(true, col, value)
    }

    fn le_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_compare(gate, col.into(), "<=", value.into());
        self
    }

    // ==================== LIKE ====================

    /// `col LIKE '%v%'`
    fn like(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.like_if(true, col, value)
    }

    fn like_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_like(gate, col.into(), false, true, true, value.into());
        self
    }

    fn not_like(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.not_like_if(true, col, value)
    }

    fn not_like_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_like(gate, col.into(), true, true, true, value.into());
        self
    }

    /// `col LIKE '%v'`
    fn like_left(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.like_left_if(true, col, value)
    }

    fn like_left_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_like(gate, col.into(), false, true, false, value.into());
        self
    }

    fn not_like_left(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.not_like_left_if(true, col, value)
    }

    fn not_like_left_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_like(gate, col.into(), true, true, false, value.into());
        self
    }

    /// `col LIKE 'v%'`
    fn like_right(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.like_right_if(true, col, value)
    }

    fn like_right_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_like(gate, col.into(), false, false, true, value.into());
        self
    }

    fn not_like_right(self, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.not_like_right_if(true, col, value)
    }

    fn not_like_right_if(mut self, gate: bool, col: impl Into<Column<Self::Entity>>, value: impl Into<Value>) -> Self {
        self.conditions().push_like(gate, col.into(), true, false, true, value.into());
        self
    }

    // ==================== IN ====================

    /// `col IN (...)`. An empty list renders `1=0`.
    fn in_list<V: Into<Value>>(
        self,
        col: impl Into<Column<Self::Entity>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.in_list_if(true, col, values)
    }

    fn in_list_if<V: Into<Value>>(
        mut self,
        gate: bool,
        col: impl Into<Column<Self::Entity>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        if gate {
            let values = values.into_iter().map(Into::into).collect();
            self.conditions().push_in(true, col.into(), false, values);
        }
        self
    }

    /// `col NOT IN (...)`. An empty list renders `1=1`.
    fn not_in_list<V: Into<Value>>(
        self,
        col: impl Into<Column<Self::Entity>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        self.not_in_list_if(true, col, values)
    }

    fn not_in_list_if<V: Into<Value>>(
        mut self,
        gate: bool,
        col: impl Into<Column<Self::Entity>>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        if gate {
            let values = values.into_iter().map(Into::into).collect();
            self.conditions().push_in(true, col.into(), true, values);
        }
        self
    }

    /// `col IN (subquery)`
    fn in_query<M: 'static>(
        self,
        col: impl Into<Column<Self::Entity>>,
        f: impl FnOnce(SubQuery) -> QueryBuilder<M>,
    ) -> Self {
        self.in_query_if(true, col, f)
    }

    fn in_query_if<M: 'static>(
        mut self,
        gate: bool,
        col: impl Into<Column<Self::Entity>>,
        f: impl FnOnce(SubQuery) -> QueryBuilder<M>,
    ) -> Self {
        self.conditions().push_in_query(gate, col.into(), false, f);
        self
    }

    fn not_in_query<M: 'static>(
        self,
        col: impl Into<Column<Self::Entity>>,
        f: impl FnOnce(SubQuery) -> QueryBuilder<M>,
    ) -> Self {
        self.not_in_query_if(true, col, f)
    }

    fn not_in_query_if<M: 'static>(
        mut self,
        gate: bool,
        col: impl Into<Column<Self::Entity>>,
        f: impl FnOnce(SubQuery) -> QueryBuilder<M>,
    ) -> Self {
        self.conditions().push_in_query(gate, col.into(), true, f);
        self
    }

    // ==================== EXISTS ====================

    fn exists<M: 'static>(self, f: impl FnOnce(SubQuery) -> QueryBuilder<M>) -> Self {
        self.exists_if(true, f)
    }

    fn exists_if<M: 'static>(mut self, gate: bool, f: impl FnOnce(SubQuery) -> QueryBuilder<M>) -> Self {
        self.conditions().push_exists(gate, false, f);
        self
    }

    fn not_exists<M: 'static>(self, f: impl FnOnce(SubQuery) -> QueryBuilder<M>) -> Self {
        self.not_exists_if(true, f)
    }

    fn not_exists_if<M: 'static>(mut self, gate: bool, f: impl FnOnce(SubQuery) -> QueryBuilder<M>) -> Self {
        self.conditions().push_exists(gate, true, f);
        self
    }

    // ==================== NULL / BETWEEN ====================

    /// `col IS NULL` for each column, joined with AND.
    fn is_null<C: Into<Column<Self::Entity>>>(self, cols: impl IntoIterator<Item = C>) -> Self {
        self.is_null_if(true, cols)
    }

    fn is_null_if<C: Into<Column<Self::Entity>>>(
        mut self,
        gate: bool,
        cols: impl IntoIterator<Item = C>,
    ) -> Self {
        if gate {
            let cols = cols.into_iter().map(Into::into).collect();
            self.conditions().push_null(true, cols, false);
        }
        self
    }

    fn is_not_null<C: Into<Column<Self::Entity>>>(self, cols: impl IntoIterator<Item = C>) -> Self {
        self.is_not_null_if(true, cols)
    }

    fn is_not_null_if<C: Into<Column<Self::Entity>>>(
        mut self,
        gate: bool,
        cols: impl IntoIterator<Item = C>,
    ) -> Self {
        if gate {
            let cols = cols.into_iter().map(Into::into).collect();
            self.conditions().push_null(true, cols, true);
        }
        self
    }

    fn between(
        self,
        col: impl Into<Column<Self::Entity>>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.between_if(true, col, start, end)
    }

    fn between_if(
        mut self,
        gate: bool,
        col: impl Into<Column<Self::Entity>>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.conditions()
            .push_between(gate, col.into(), false, start.into(), end.into());
        self
    }

    fn not_between(
        self,
        col: impl Into<Column<Self::Entity>>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.not_between_if(true, col, start, end)
    }

    fn not_between_if(
        mut self,
        gate: bool,
        col: impl Into<Column<Self::Entity>>,
        start: impl Into<Value>,
        end: impl Into<Value>,
    ) -> Self {
        self.conditions()
            .push_between(gate, col.into(), true, start.into(), end.into());
        self
    }

    // ==================== Junctions & groups ====================

    /// Attach the next predicate with AND (the default).
    fn and(self) -> Self {
        self.and_if(true)
    }

    fn and_if(mut self, gate: bool) -> Self {
        self.conditions().set_junction(gate, Junction::And);
        self
    }

    /// Attach the next predicate with OR.
    fn or(self) -> Self {
        self.or_if(true)
    }

    fn or_if(mut self, gate: bool) -> Self {
        self.conditions().set_junction(gate, Junction::Or);
        self
    }

    /// `AND (...)` built by `f`. Skipped when `f` adds nothing.
    fn and_nested(
        self,
        f: impl FnOnce(ConditionBuilder<Self::Entity>) -> ConditionBuilder<Self::Entity>,
    ) -> Self {
        self.and_nested_if(true, f)
    }

    fn and_nested_if(
        mut self,
        gate: bool,
        f: impl FnOnce(ConditionBuilder<Self::Entity>) -> ConditionBuilder<Self::Entity>,
    ) -> Self {
        self.conditions().push_nested(gate, Junction::And, f);
        self
    }

    /// `OR (...)` built by `f`. Skipped when `f` adds nothing.
    fn or_nested(
        self,
        f: impl FnOnce(ConditionBuilder<Self::Entity>) -> ConditionBuilder<Self::Entity>,
    ) -> Self {
        self.or_nested_if(true, f)
    }

    fn or_nested_if(
        mut self,
        gate: bool,
        f: impl FnOnce(ConditionBuilder<Self::Entity>) -> ConditionBuilder<Self::Entity>,
    ) -> Self {
        self.conditions().push_nested(gate, Junction::Or, f);
        self
    }
}

impl<T: 'static> Conditions for ConditionBuilder<T> {
    type Entity = T;

    fn conditions(&mut self) -> &mut ConditionBuilder<T> {
        self
    }
}
