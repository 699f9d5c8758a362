mod add_form;
mod controls;
mod details;
mod panels;

pub(in crate::app) use add_form::AddForm;
