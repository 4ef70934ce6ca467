pub mod image_helper;

#[cfg(test)]
pub mod synthetic;
