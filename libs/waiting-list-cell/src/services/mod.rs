pub mod waiting_list;

pub use waiting_list::WaitingListService;
