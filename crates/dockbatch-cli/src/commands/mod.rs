pub mod dock;
pub mod prepare;
