mod maintenance;
mod submit;
