mod compare;
mod controls;
mod details;
mod panels;
