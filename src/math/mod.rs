//! Tree level arithmetic over big integer node indices

pub mod levels;

pub use levels::{
    binary_pow, calc_depth, calc_level_index, ceil_log_n, div_mod, factor,
    is_perfect_log_n, log_n, points_at_depth,
};
