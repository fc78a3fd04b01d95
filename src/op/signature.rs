//! Shared function-pointer types and small reusable type rules used by
//! [`super::builtin`] to build the default catalog.
//!
//! Every [`Operation`](super::Operation) is checked against the dtypes of
//! its `Input`-role arguments only; `Shape`/`Index`/`Memory`-role edges are
//! structural, not value-producing, and are validated separately by shape
//! algebra (C2) and the IR's own edge bookkeeping (C3).

use crate::dtype::DataType;

pub type AcceptsFn = fn(&[DataType]) -> bool;
pub type OutputTypeFn = fn(&[DataType]) -> Option<DataType>;

pub(super) fn accepts_none(inputs: &[DataType]) -> bool {
    inputs.is_empty()
}

pub(super) fn accepts_unary_numeric(inputs: &[DataType]) -> bool {
    inputs.len() == 1 && inputs[0].is_numeric()
}

pub(super) fn accepts_unary_any(inputs: &[DataType]) -> bool {
    inputs.len() == 1
}

pub(super) fn accepts_binary_numeric_same(inputs: &[DataType]) -> bool {
    inputs.len() == 2 && inputs[0].is_numeric() && inputs[0] == inputs[1]
}

pub(super) fn accepts_binary_same(inputs: &[DataType]) -> bool {
    inputs.len() == 2 && inputs[0] == inputs[1]
}

pub(super) fn accepts_binary_bool(inputs: &[DataType]) -> bool {
    inputs.len() == 2 && inputs[0] == DataType::Bool && inputs[1] == DataType::Bool
}

pub(super) fn accepts_unary_bool(inputs: &[DataType]) -> bool {
    inputs.len() == 1 && inputs[0] == DataType::Bool
}

pub(super) fn accepts_variadic(_inputs: &[DataType]) -> bool {
    true
}

pub(super) fn output_same_as_first(inputs: &[DataType]) -> Option<DataType> {
    inputs.first().copied()
}

pub(super) fn output_bool(inputs: &[DataType]) -> Option<DataType> {
    if inputs.is_empty() {
        None
    } else {
        Some(DataType::Bool)
    }
}

pub(super) fn output_bool_always(_inputs: &[DataType]) -> Option<DataType> {
    Some(DataType::Bool)
}

pub(super) fn output_none(_inputs: &[DataType]) -> Option<DataType> {
    Some(DataType::None)
}

pub(super) fn output_int(_inputs: &[DataType]) -> Option<DataType> {
    Some(DataType::Int)
}

pub(super) fn output_float(_inputs: &[DataType]) -> Option<DataType> {
    Some(DataType::Float)
}

pub(super) fn output_uint(_inputs: &[DataType]) -> Option<DataType> {
    Some(DataType::Uint)
}
