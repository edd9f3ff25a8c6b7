pub mod c_includes;
