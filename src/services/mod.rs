pub mod image;
pub use image::{ImageError, ImageService};

pub mod recipe_service;
pub use recipe_service::{RecipeError, RecipeInput, RecipeService};

pub mod recipe_service_impl;
pub use recipe_service_impl::SeaOrmRecipeService;

pub mod user_service;
pub use user_service::{ProfileUpdate, Registration, UserError, UserProfile, UserService};

pub mod user_service_impl;
pub use user_service_impl::SeaOrmUserService;
