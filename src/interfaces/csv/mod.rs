pub mod order_reader;
pub mod payout_writer;
pub mod settle;
