// Stage test module
#[cfg(test)]
mod common;
