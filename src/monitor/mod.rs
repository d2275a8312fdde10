//! Sampling loop and the online reductions it feeds: history, running totals,
//! interval averages, deltas, and linear forecasts.

pub mod aggregate;
pub mod forecast;
pub mod sampler;
