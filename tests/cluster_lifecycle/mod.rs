mod failure_test;
mod start_stop_test;
