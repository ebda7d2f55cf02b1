pub mod config;
pub mod dispatcher;
pub mod error;
pub mod keyword_finder;
pub mod partition;
pub mod process_worker;
pub mod results;
pub mod thread_worker;
pub mod util;

pub use config::{encoding_for_label, ConcurrencyMode, KeywordSet, ScanConfig};
pub use dispatcher::{run_scan, scan_all, strategy_for, ScanOptions, WorkerGroup, WorkerStrategy};
pub use error::{ScanError, WorkerFault};
pub use keyword_finder::{match_file, scan_chunk};
pub use process_worker::{run_worker, ProcessStrategy, WORKER_COMMAND};
pub use results::{merge_all, ChunkFault, ChunkResult, MatchMap, ScanReport, UnreadableFile};
pub use thread_worker::ThreadStrategy;
pub use util::list_files;
