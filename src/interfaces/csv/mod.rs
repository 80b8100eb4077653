pub mod pool_writer;
