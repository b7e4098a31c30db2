pub mod toolpath_lines;
