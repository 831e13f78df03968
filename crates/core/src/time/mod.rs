pub mod reference_date;
