mod pipeline;
mod reflection;
