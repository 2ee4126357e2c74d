pub mod mpsc_task_queue;
pub mod staging_sweeper;
pub mod worker_pool;

pub use mpsc_task_queue::{Envelope, MpscTaskQueue, MpscTaskQueueReceiver};
pub use staging_sweeper::StagingSweeper;
pub use worker_pool::WorkerPool;
