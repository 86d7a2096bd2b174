mod registry;
mod run;
mod types;

pub use registry::{TriggerHandler, TriggerRegistry};
pub use run::{
    maybe_run_after_find_trigger, maybe_run_file_trigger,
    maybe_run_query_trigger, maybe_run_trigger,
};
pub use types::{
    FileInfo, QueryOverrides, TriggerQuery, TriggerRequest, TriggerResponse,
    TriggerResult, TriggerType,
};
