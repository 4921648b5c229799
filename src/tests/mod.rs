pub mod divergence_tests;
