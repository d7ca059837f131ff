/*!
This module renders rows of strings as a plain text table, which is how the command line prints statistics, frequency tables and column listings.

```text
| Statistic | Value |
|-----------|-------|
| Mean      | 3.000 |
```
*/

pub struct Table<'a> {
	padding: usize,
	header: &'a [&'a str],
	rows: &'a [Vec<String>],
}

impl<'a> Table<'a> {
	pub fn new(header: &'a [&'a str], rows: &'a [Vec<String>]) -> Self {
		Self {
			padding: 1,
			header,
			rows,
		}
	}

	pub fn with_padding(mut self, padding: usize) -> Self {
		self.padding = padding;
		self
	}
}

impl<'a> std::fmt::Display for Table<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		// Each column is as wide as its widest cell, including the header.
		let mut column_widths: Vec<usize> = self
			.header
			.iter()
			.map(|header| header.chars().count())
			.collect();
		for row in self.rows.iter() {
			for (column_width, value) in column_widths.iter_mut().zip(row.iter()) {
				*column_width = usize::max(*column_width, value.chars().count());
			}
		}
		let line = Line {
			column_widths: &column_widths,
			padding: self.padding,
		};
		let header: Vec<&str> = self.header.to_vec();
		let row = Row {
			column_widths: &column_widths,
			padding: self.padding,
			values: &header,
		};
		writeln!(f, "{}", row)?;
		writeln!(f, "{}", line)?;
		for values in self.rows.iter() {
			let values: Vec<&str> = values.iter().map(|value| value.as_str()).collect();
			let row = Row {
				column_widths: &column_widths,
				padding: self.padding,
				values: &values,
			};
			writeln!(f, "{}", row)?;
		}
		Ok(())
	}
}

struct Line<'a> {
	column_widths: &'a [usize],
	padding: usize,
}

impl<'a> std::fmt::Display for Line<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for column_width in self.column_widths.iter() {
			for _ in 0..column_width + 2 * self.padding {
				write!(f, "-")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

struct Row<'a> {
	column_widths: &'a [usize],
	padding: usize,
	values: &'a [&'a str],
}

impl<'a> std::fmt::Display for Row<'a> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "|")?;
		for (column_width, value) in self.column_widths.iter().zip(self.values) {
			for _ in 0..self.padding {
				write!(f, " ")?;
			}
			write!(f, "{}", value)?;
			for _ in 0..column_width + self.padding - value.chars().count() {
				write!(f, " ")?;
			}
			write!(f, "|")?;
		}
		Ok(())
	}
}

#[test]
fn test_table() {
	let rows = vec![
		vec!["Mean".to_owned(), "3.000".to_owned()],
		vec!["Variance".to_owned(), "2.000".to_owned()],
	];
	let table = Table::new(&["Statistic", "Value"], &rows);
	let expected = "| Statistic | Value |\n|-----------|-------|\n| Mean      | 3.000 |\n| Variance  | 2.000 |\n";
	assert_eq!(table.to_string(), expected);
}

#[test]
fn test_table_without_padding() {
	let rows = vec![vec!["a".to_owned(), "12".to_owned()]];
	let table = Table::new(&["Bin", "Count"], &rows).with_padding(0);
	assert_eq!(table.to_string(), "|Bin|Count|\n|---|-----|\n|a  |12   |\n");
}
