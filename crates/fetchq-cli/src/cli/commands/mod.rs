//! CLI command handlers, one file per command.

mod add;
mod checksum;
mod list;
mod run;
mod status;

pub use add::{parse_link, run_add, AddArgs};
pub use checksum::run_checksum;
pub use list::run_list;
pub use run::{join_poller, report_lines, run_dispatcher, RunArgs};
pub use status::run_status;
