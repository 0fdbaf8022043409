pub mod basic_functions;
pub mod spatial_ref;

#[cfg(test)]
pub(crate) mod http_stub;
