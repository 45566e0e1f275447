mod fixtures;
mod rpc_tests;
mod script_tests;
mod store_tests;
