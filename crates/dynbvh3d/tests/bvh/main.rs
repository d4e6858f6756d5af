mod moving_scene;
mod ray_picking;
mod scene;
