pub mod mock_ai;
pub mod mock_diff;
pub mod mock_threads;
