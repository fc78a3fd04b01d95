//! Compile-time tunables threaded through every graph transform pass and
//! the buffer pool.

use crate::op::{default_catalog, OpCatalog};

#[derive(Clone)]
pub struct CompileOptions {
    /// Loops whose trip count resolves to a compile-time constant below
    /// this bound are fully unrolled by the `unroll_loops` pass.
    pub unroll_threshold: u32,
    /// Buffer pool: a retired buffer of size `k` satisfies a request of
    /// size `s` when `s <= k <= factor * s`.
    pub size_class_factor: u64,
    /// Buffer pool: ticks a non-leased buffer may sit idle before it moves
    /// to `pending_delete`.
    pub aging_threshold: u32,
    /// The operation catalog every pass consults. Defaults to the
    /// process-wide builtin catalog; tests inject their own to avoid
    /// depending on global state.
    pub catalog: OpCatalog,
}

impl CompileOptions {
    pub fn with_catalog(catalog: OpCatalog) -> Self {
        CompileOptions {
            catalog,
            ..Self::default()
        }
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            unroll_threshold: 16,
            size_class_factor: 8,
            aging_threshold: 512,
            catalog: default_catalog().clone(),
        }
    }
}

impl std::fmt::Debug for CompileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompileOptions")
            .field("unroll_threshold", &self.unroll_threshold)
            .field("size_class_factor", &self.size_class_factor)
            .field("aging_threshold", &self.aging_threshold)
            .field("catalog_len", &self.catalog.len())
            .finish()
    }
}
