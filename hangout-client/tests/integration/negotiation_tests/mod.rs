pub mod test_candidate_buffering;
