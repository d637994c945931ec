mod categories;
mod phrases;
