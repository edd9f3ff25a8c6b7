pub mod python_imports;
