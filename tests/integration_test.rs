mod cluster_lifecycle;
mod common;
