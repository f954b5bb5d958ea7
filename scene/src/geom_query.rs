mod pick_query;
mod ray_picking;

// Re-export the generic picking trait and function
pub use pick_query::{pick_all, PickQuery};

// Re-export ray picking
pub use ray_picking::{pick_all_from_ray, RayPickQuery, RayPickResult};
