pub mod stop_points;
